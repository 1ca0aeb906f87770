//! The external sandbox executor interface.
//!
//! Warden defines only the decision logic that gates entry into a real
//! executor; the executor itself is an injected collaborator with a single
//! capability. When no adapter is wired in, the engine degrades transparently
//! to simulate-only mode for every tool.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ToolDescriptor;
use crate::error::KernelResult;

/// Executes a tool for real, in whatever isolation the embedding
/// application provides.
#[async_trait]
pub trait SandboxAdapter: Send + Sync {
    /// Execute `tool` with `inputs` and return its outputs.
    ///
    /// # Errors
    ///
    /// An error is a collaborator fault and aborts the simulation run; a
    /// tool that merely produces bad output should return that output and
    /// let the CRV gate judge it.
    async fn execute(&self, tool: &ToolDescriptor, inputs: &Value) -> KernelResult<Value>;
}

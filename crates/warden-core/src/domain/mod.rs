//! Domain types for the governance kernel.
//!
//! Everything here is a plain serde value type. Risk tiers, decision enums,
//! tool-call statuses, and CRV failure codes are closed vocabularies and
//! serialize to stable snake_case strings — downstream tooling treats them
//! as a wire contract.

pub mod blueprint;
pub mod commit;
pub mod risk;
pub mod workflow;

pub use blueprint::{AgentBlueprint, Principal, TestScenario, ToolDescriptor};
pub use commit::{Commit, CommitMetadata};
pub use risk::RiskTier;
pub use workflow::{RetryPolicy, TaskSpec, WorkflowSpec};

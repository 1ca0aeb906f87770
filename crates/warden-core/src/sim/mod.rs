//! Sandboxed simulation / execution.
//!
//! The [`SimulationEngine`] is the integration point of the kernel: it runs a
//! blueprint under a test scenario, consulting the DAG validator, the policy
//! guard, and the CRV gate for every unit of work, and produces an immutable
//! [`SimulationResult`] plus an audit trail in the external event log.
//!
//! One simulation run is strictly sequential — trace step numbers are
//! causally meaningful. Independent runs may execute concurrently; they
//! share nothing but the event log, whose appends are atomic.

pub mod engine;
pub mod result;
pub mod sandbox;

pub use engine::{EngineConfig, SimulationEngine, SimulationRequest};
pub use result::{
    BlockedStep, CrvOutcome, SideEffectRecord, SimulationResult, StepStatus, ToolCallRecord,
    ToolCallStatus, TraceStep,
};
pub use sandbox::SandboxAdapter;

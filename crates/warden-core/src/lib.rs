//! Warden Core Library
//!
//! The agent governance kernel: given a declarative agent blueprint or
//! workflow, Warden decides *whether*, *how*, and *under what supervision*
//! each unit of work may run, and records an auditable trace of what
//! happened.
//!
//! Four tightly coupled engines:
//!
//! - [`dag`] — workflow DAG validation (acyclicity, resolvability, ordering)
//! - [`policy`] — risk-tiered approval decisions with time-boxed tokens
//! - [`crv`] — Commit-Review-Validate output gating with confidence scoring
//! - [`sim`] — the simulation/execution engine tying the other three
//!   together while producing a trace, blocked-step list, and side-effect
//!   ledger
//!
//! Persistence, transport, and real execution are external collaborators
//! behind the interfaces in `warden-state` and [`sim::SandboxAdapter`].

pub mod crv;
pub mod dag;
pub mod domain;
mod error;
pub mod policy;
pub mod sim;
pub mod telemetry;

pub use dag::{validate_crv_rules, validate_policy, validate_topology, Advisory, TopologyError, TopologyReport};

pub use domain::{
    AgentBlueprint, Commit, CommitMetadata, Principal, RetryPolicy, RiskTier, TaskSpec,
    TestScenario, ToolDescriptor, WorkflowSpec,
};

pub use crv::{CrvGate, FailureCode, GateOutcome, NamedResult, ValidationResult, Validator};

pub use error::{KernelError, KernelResult};

pub use policy::{ActionRequest, Decision, PolicyDecision, PolicyGuard, TokenRecord, TokenStore};

pub use sim::{
    BlockedStep, CrvOutcome, EngineConfig, SandboxAdapter, SideEffectRecord, SimulationEngine,
    SimulationRequest, SimulationResult, StepStatus, ToolCallRecord, ToolCallStatus, TraceStep,
};

pub use warden_state::{
    event_kinds, EventFilter, EventLog, GovEvent, MemoryEventLog, MemoryStateStore, StateStore,
    StorageError, StorageResult,
};

//! Storage trait definitions for Warden
//!
//! These traits define the kernel's external collaborator abstractions:
//! - `EventLog`: append-only audit log partitioned by workflow id
//! - `StateStore`: workflow/task state snapshots
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StorageResult;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Event kinds written by the governance kernel.
///
/// The vocabulary is closed and treated as a wire contract; backends and
/// downstream tooling may rely on these exact strings.
pub mod event_kinds {
    /// Emitted once before the first tool of a simulation run.
    pub const SIMULATION_STARTED: &str = "simulation_started";
    /// Emitted once after the last tool of a simulation run.
    pub const SIMULATION_COMPLETED: &str = "simulation_completed";
    /// A policy guard decision, embedded in `data`.
    pub const POLICY_DECISION: &str = "policy_decision";
    /// A CRV gate outcome, embedded in `data`.
    pub const CRV_OUTCOME: &str = "crv_outcome";

    /// All kinds the kernel itself writes.
    pub const ALL: &[&str] = &[
        SIMULATION_STARTED,
        SIMULATION_COMPLETED,
        POLICY_DECISION,
        CRV_OUTCOME,
    ];
}

/// A single audit event, the atomic unit of an `EventLog` append.
///
/// `seq` is assigned by the log at append time and is monotonic within one
/// workflow partition; callers pass `0` and read the assigned value from the
/// return of [`EventLog::append`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovEvent {
    /// Monotonic sequence number within the workflow partition.
    pub seq: u64,
    /// Timestamp supplied by the producer.
    pub timestamp: DateTime<Utc>,
    /// Event kind (see [`event_kinds`]).
    pub kind: String,
    /// Workflow partition key.
    pub workflow_id: String,
    /// Task the event concerns, when applicable.
    pub task_id: Option<String>,
    /// Structured payload (policy decisions, CRV outcomes, run summaries).
    pub data: Option<Value>,
    /// Arbitrary producer metadata.
    pub metadata: Option<Value>,
}

impl GovEvent {
    /// Build an event with `seq = 0` (assigned at append time).
    pub fn new(kind: impl Into<String>, workflow_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            seq: 0,
            timestamp: now,
            kind: kind.into(),
            workflow_id: workflow_id.into(),
            task_id: None,
            data: None,
            metadata: None,
        }
    }

    /// Attach a task id.
    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Attach a structured payload.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach producer metadata.
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Filter for [`EventLog::query_events`]. Empty filter matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Restrict to one workflow partition.
    pub workflow_id: Option<String>,
    /// Restrict to one event kind.
    pub kind: Option<String>,
    /// Only events at or after this timestamp.
    pub since: Option<DateTime<Utc>>,
}

/// Append-only audit log, partitioned by workflow id.
///
/// Guarantees:
/// - Each append is a single atomic unit; concurrent appends to different
///   partitions never interleave within one event.
/// - Events within a partition are ordered by monotonic `seq`.
/// - Past events are never mutated; the log only grows.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Append an event, returning the sequence number assigned to it.
    async fn append(&self, event: GovEvent) -> StorageResult<u64>;

    /// Retrieve all events for a workflow, ordered by `seq`.
    async fn read(&self, workflow_id: &str) -> StorageResult<Vec<GovEvent>>;

    /// Retrieve events matching a filter, ordered by partition then `seq`.
    async fn query_events(&self, filter: &EventFilter) -> StorageResult<Vec<GovEvent>>;
}

// ---------------------------------------------------------------------------
// State store
// ---------------------------------------------------------------------------

/// Workflow/task state snapshots.
///
/// A missing snapshot is a soft miss (`Ok(None)`), not an error; `Err` is
/// reserved for backend faults. The kernel itself never depends on state
/// being present — persistence is entirely the collaborator's concern.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Save the state snapshot for a workflow.
    async fn save_workflow_state(&self, workflow_id: &str, state: Value) -> StorageResult<()>;

    /// Load the state snapshot for a workflow, if any.
    async fn load_workflow_state(&self, workflow_id: &str) -> StorageResult<Option<Value>>;

    /// Save the state snapshot for a task within a workflow.
    async fn save_task_state(
        &self,
        workflow_id: &str,
        task_id: &str,
        state: Value,
    ) -> StorageResult<()>;

    /// Load the state snapshot for a task within a workflow, if any.
    async fn load_task_state(
        &self,
        workflow_id: &str,
        task_id: &str,
    ) -> StorageResult<Option<Value>>;
}

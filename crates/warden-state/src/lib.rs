//! Warden-State: External Collaborator Interfaces
//!
//! The governance kernel itself is stateless between calls. Everything it
//! needs to remember — decision events, trace events, workflow/task state
//! snapshots — lives behind the narrow interfaces defined here and is owned
//! by whatever backend the embedding application wires in.
//!
//! ## Key Components
//!
//! - `EventLog`: append-only audit log, partitioned and ordered by workflow id
//! - `StateStore`: workflow/task state snapshots keyed by workflow (+ task) id
//! - `fakes`: in-memory implementations satisfying the trait contracts,
//!   used by tests and by callers that do not wire a real backend

mod error;
pub mod fakes;
pub mod storage_traits;

pub use error::{StorageError, StorageResult};
pub use fakes::{MemoryEventLog, MemoryStateStore};
pub use storage_traits::{event_kinds, EventFilter, EventLog, GovEvent, StateStore};

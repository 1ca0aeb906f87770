//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryEventLog` and `MemoryStateStore` that satisfy the trait
//! contracts without any external dependencies.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageResult;
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryEventLog
// ---------------------------------------------------------------------------

/// In-memory event log backed by a `HashMap<workflow_id, Vec<GovEvent>>`.
///
/// The whole map is guarded by one mutex, so each append is atomic and
/// sequence numbers are monotonic per partition even under concurrent use.
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    partitions: Mutex<HashMap<String, Vec<GovEvent>>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total events across all partitions (test convenience).
    pub fn len(&self) -> usize {
        let partitions = self.partitions.lock().unwrap();
        partitions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventLog for MemoryEventLog {
    async fn append(&self, mut event: GovEvent) -> StorageResult<u64> {
        let mut partitions = self.partitions.lock().unwrap();
        let events = partitions.entry(event.workflow_id.clone()).or_default();
        let seq = events.len() as u64;
        event.seq = seq;
        events.push(event);
        Ok(seq)
    }

    async fn read(&self, workflow_id: &str) -> StorageResult<Vec<GovEvent>> {
        let partitions = self.partitions.lock().unwrap();
        Ok(partitions.get(workflow_id).cloned().unwrap_or_default())
    }

    async fn query_events(&self, filter: &EventFilter) -> StorageResult<Vec<GovEvent>> {
        let partitions = self.partitions.lock().unwrap();
        let mut keys: Vec<&String> = match &filter.workflow_id {
            Some(id) => partitions.keys().filter(|k| *k == id).collect(),
            None => partitions.keys().collect(),
        };
        keys.sort();

        let mut out = Vec::new();
        for key in keys {
            for event in &partitions[key] {
                if let Some(kind) = &filter.kind {
                    if &event.kind != kind {
                        continue;
                    }
                }
                if let Some(since) = filter.since {
                    if event.timestamp < since {
                        continue;
                    }
                }
                out.push(event.clone());
            }
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// MemoryStateStore
// ---------------------------------------------------------------------------

/// In-memory state store backed by plain `HashMap`s.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    workflows: Mutex<HashMap<String, Value>>,
    tasks: Mutex<HashMap<(String, String), Value>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn save_workflow_state(&self, workflow_id: &str, state: Value) -> StorageResult<()> {
        let mut workflows = self.workflows.lock().unwrap();
        workflows.insert(workflow_id.to_string(), state);
        Ok(())
    }

    async fn load_workflow_state(&self, workflow_id: &str) -> StorageResult<Option<Value>> {
        let workflows = self.workflows.lock().unwrap();
        Ok(workflows.get(workflow_id).cloned())
    }

    async fn save_task_state(
        &self,
        workflow_id: &str,
        task_id: &str,
        state: Value,
    ) -> StorageResult<()> {
        let mut tasks = self.tasks.lock().unwrap();
        tasks.insert((workflow_id.to_string(), task_id.to_string()), state);
        Ok(())
    }

    async fn load_task_state(
        &self,
        workflow_id: &str,
        task_id: &str,
    ) -> StorageResult<Option<Value>> {
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks
            .get(&(workflow_id.to_string(), task_id.to_string()))
            .cloned())
    }
}

//! Workflow and task specifications.
//!
//! A [`WorkflowSpec`] is a declarative task graph: an ordered list of tasks
//! plus a dependency map from task id to the ids it depends on. Constructors
//! enforce only the locally checkable invariants (unique task ids, positive
//! timeouts); graph-level invariants (no dangling references, acyclicity)
//! belong to [`crate::dag::validate_topology`], which collects *all* problems
//! instead of failing on the first.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, KernelResult};

use super::risk::RiskTier;

/// Retry policy metadata carried by a task.
///
/// The kernel never retries anything itself — this is interpreted by the
/// real executor. High/Critical tasks are expected to carry one; the DAG
/// validator's policy scan surfaces an advisory when they don't.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

/// A single unit of work in a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Unique id within the owning workflow.
    pub id: String,
    pub name: String,
    /// Free-form task type label (e.g. "llm_call", "tool_call", "human_review").
    pub task_type: String,
    pub risk_tier: RiskTier,
    /// Execution timeout in milliseconds. Must be positive.
    pub timeout_ms: u64,
    pub retry: Option<RetryPolicy>,
    /// Compensation task id to run if this task must be undone.
    pub compensation: Option<String>,
    /// Permissions the executing principal must hold.
    #[serde(default)]
    pub required_permissions: Vec<String>,
}

impl TaskSpec {
    /// Create a task with the given id, name, type, and risk tier.
    /// Timeout defaults to 30s; adjust with [`TaskSpec::with_timeout_ms`].
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        task_type: impl Into<String>,
        risk_tier: RiskTier,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            task_type: task_type.into(),
            risk_tier,
            timeout_ms: 30_000,
            retry: None,
            compensation: None,
            required_permissions: Vec::new(),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retry(mut self, max_attempts: u32, backoff_ms: u64) -> Self {
        self.retry = Some(RetryPolicy {
            max_attempts,
            backoff_ms,
        });
        self
    }

    pub fn with_compensation(mut self, task_id: impl Into<String>) -> Self {
        self.compensation = Some(task_id.into());
        self
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.required_permissions.push(permission.into());
        self
    }
}

/// A declarative workflow: ordered tasks plus a dependency relation.
///
/// `dependencies` maps task id → ids it depends on. `BTreeMap` keeps
/// iteration deterministic, which the topology validator relies on for
/// reproducible error and ordering output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    pub id: String,
    pub name: String,
    pub tasks: Vec<TaskSpec>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, Vec<String>>,
}

impl WorkflowSpec {
    /// Build a workflow, enforcing locally checkable invariants:
    /// every task id unique and every `timeout_ms` positive.
    ///
    /// # Errors
    ///
    /// Returns `KernelError::InvalidSpec` on a duplicate task id or a zero
    /// timeout. Dangling or cyclic dependencies are *not* rejected here —
    /// they are collected by `validate_topology`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        tasks: Vec<TaskSpec>,
        dependencies: BTreeMap<String, Vec<String>>,
    ) -> KernelResult<Self> {
        let mut seen = HashSet::new();
        for task in &tasks {
            if !seen.insert(task.id.as_str()) {
                return Err(KernelError::InvalidSpec(format!(
                    "duplicate task id: {}",
                    task.id
                )));
            }
            if task.timeout_ms == 0 {
                return Err(KernelError::InvalidSpec(format!(
                    "task {} has zero timeout",
                    task.id
                )));
            }
        }
        Ok(Self {
            id: id.into(),
            name: name.into(),
            tasks,
            dependencies,
        })
    }

    /// Look up a task by id.
    pub fn task(&self, id: &str) -> Option<&TaskSpec> {
        self.tasks.iter().find(|t| t.id == id)
    }
}

//! Agent blueprints — the declarative description of an agent the kernel
//! governs: its goal, tools, workflows, policies, and limits.
//!
//! A blueprint is immutable once produced; merging and versioning are owned
//! by an external collaborator, not the kernel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::risk::RiskTier;
use super::workflow::WorkflowSpec;

/// A tool an agent may invoke, as declared by its blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub tool_id: String,
    pub name: String,
    pub risk_tier: RiskTier,
    /// Whether invoking the tool changes the outside world. Side-effecting
    /// tools get a ledger entry even when only simulated.
    pub has_side_effects: bool,
}

impl ToolDescriptor {
    pub fn new(
        tool_id: impl Into<String>,
        name: impl Into<String>,
        risk_tier: RiskTier,
        has_side_effects: bool,
    ) -> Self {
        Self {
            tool_id: tool_id.into(),
            name: name.into(),
            risk_tier,
            has_side_effects,
        }
    }
}

/// Declarative agent blueprint submitted to the simulation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentBlueprint {
    pub id: String,
    pub name: String,
    pub goal: String,
    pub risk_profile: RiskTier,
    /// Tools in declaration order — simulation iterates them in this order.
    pub tools: Vec<ToolDescriptor>,
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(default)]
    pub workflows: Vec<WorkflowSpec>,
    #[serde(default)]
    pub constraints: Vec<String>,
    pub max_execution_time_ms: u64,
    pub max_retries: u32,
    #[serde(default)]
    pub success_criteria: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgentBlueprint {
    /// Create a minimal blueprint. Collections start empty; populate with
    /// the `with_*` builders.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        goal: impl Into<String>,
        risk_profile: RiskTier,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            goal: goal.into(),
            risk_profile,
            tools: Vec::new(),
            policies: Vec::new(),
            workflows: Vec::new(),
            constraints: Vec::new(),
            max_execution_time_ms: 300_000,
            max_retries: 3,
            success_criteria: Vec::new(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_tool(mut self, tool: ToolDescriptor) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_workflow(mut self, workflow: WorkflowSpec) -> Self {
        self.workflows.push(workflow);
        self
    }

    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policies.push(policy.into());
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// The subject a policy decision is made about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub actor: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Principal {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            permissions: Vec::new(),
        }
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }
}

/// Scenario under which a blueprint is simulated: who is running it and
/// with what inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestScenario {
    pub name: String,
    pub principal: Principal,
    pub inputs: Value,
}

impl TestScenario {
    pub fn new(name: impl Into<String>, principal: Principal, inputs: Value) -> Self {
        Self {
            name: name.into(),
            principal,
            inputs,
        }
    }
}

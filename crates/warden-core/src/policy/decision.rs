//! Policy decision types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::RiskTier;

/// The verdict of a policy evaluation. Closed vocabulary, wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny,
    RequiresApproval,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Deny => write!(f, "deny"),
            Self::RequiresApproval => write!(f, "requires_approval"),
        }
    }
}

/// A recorded policy decision — what was decided, when, and why.
///
/// For `requires_approval` on a Critical action, `approval_path` carries the
/// escalation chain and `estimated_approval_secs` an advisory display-only
/// estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub policy_name: String,
    pub decision: Decision,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
    pub approval_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub approval_path: Option<Vec<String>>,
    pub estimated_approval_secs: Option<u64>,
}

impl PolicyDecision {
    pub fn new(
        policy_name: impl Into<String>,
        decision: Decision,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            policy_name: policy_name.into(),
            decision,
            timestamp,
            reason: None,
            approval_token: None,
            token_expires_at: None,
            approval_path: None,
            estimated_approval_secs: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// The unit the guard decides on: an action with its risk tier, required
/// permissions, and any explicit deny rules (matched against the principal's
/// actor name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub name: String,
    pub risk_tier: RiskTier,
    /// Permissions a principal must hold for High-tier auto-allow.
    #[serde(default)]
    pub required_permissions: Vec<String>,
    /// Actor names explicitly denied this action.
    #[serde(default)]
    pub deny_rules: Vec<String>,
}

impl ActionRequest {
    pub fn new(name: impl Into<String>, risk_tier: RiskTier) -> Self {
        Self {
            name: name.into(),
            risk_tier,
            required_permissions: Vec::new(),
            deny_rules: Vec::new(),
        }
    }

    pub fn with_required_permission(mut self, permission: impl Into<String>) -> Self {
        self.required_permissions.push(permission.into());
        self
    }

    pub fn with_deny_rule(mut self, actor: impl Into<String>) -> Self {
        self.deny_rules.push(actor.into());
        self
    }
}

//! The policy guard — risk-tiered approval decisions.

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, warn};

use warden_state::{event_kinds, EventLog, GovEvent};

use crate::domain::Principal;
use crate::error::KernelResult;

use super::decision::{ActionRequest, Decision, PolicyDecision};
use super::tokens::{TokenStatus, TokenStore};

/// Evaluates actions against a fixed risk-tier rule table.
///
/// Every decision is computed fresh from the action and principal; the only
/// state carried between calls is the injected [`TokenStore`]. Evaluation is
/// synchronous and does no I/O — only [`PolicyGuard::deny_action`] touches
/// the event log.
pub struct PolicyGuard {
    tokens: TokenStore,
}

impl PolicyGuard {
    pub fn new(tokens: TokenStore) -> Self {
        Self { tokens }
    }

    /// The token store, for issuing approvals.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Decide whether `principal` may perform `action` at `now`.
    ///
    /// A presented `token` is checked (and consumed) atomically: expired
    /// tokens are treated as absent, future-dated tokens are rejected
    /// outright, and a consumed token can never upgrade a second decision.
    /// Critical actions additionally require the token to carry a
    /// multi-party chain of at least two approvers.
    pub fn evaluate(
        &self,
        action: &ActionRequest,
        principal: &Principal,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> PolicyDecision {
        use crate::domain::RiskTier::*;

        let decision = match action.risk_tier {
            Low => PolicyDecision::new(&action.name, Decision::Allow, now)
                .with_reason("low risk: allowed"),

            Medium => {
                if action.deny_rules.iter().any(|d| d == &principal.actor) {
                    PolicyDecision::new(&action.name, Decision::Deny, now).with_reason(format!(
                        "explicit deny rule matches actor {}",
                        principal.actor
                    ))
                } else {
                    PolicyDecision::new(&action.name, Decision::Allow, now)
                        .with_reason("medium risk: no deny rule matched")
                }
            }

            High => match self.check_token(action, token, 1, now) {
                Some(upgrade) => upgrade,
                None if self.holds_required_permissions(action, principal) => {
                    PolicyDecision::new(&action.name, Decision::Allow, now).with_reason(format!(
                        "principal {} holds required permissions",
                        principal.actor
                    ))
                }
                None => PolicyDecision::new(&action.name, Decision::RequiresApproval, now)
                    .with_reason("high risk: approval required"),
            },

            Critical => match self.check_token(action, token, 2, now) {
                Some(upgrade) => upgrade,
                None => {
                    let mut d =
                        PolicyDecision::new(&action.name, Decision::RequiresApproval, now)
                            .with_reason(
                                "critical risk: multi-party approval chain required",
                            );
                    d.approval_path = Some(
                        action
                            .risk_tier
                            .escalation_path()
                            .iter()
                            .map(|s| s.to_string())
                            .collect(),
                    );
                    d.estimated_approval_secs =
                        Some(action.risk_tier.estimated_approval_secs());
                    d
                }
            },
        };

        debug!(
            action = %action.name,
            tier = %action.risk_tier,
            actor = %principal.actor,
            decision = %decision.decision,
            "policy evaluated"
        );
        decision
    }

    /// True iff the action declares permissions and the principal holds all
    /// of them. An action with no declared permissions has nothing a
    /// principal could satisfy, so it stays on the approval path.
    fn holds_required_permissions(&self, action: &ActionRequest, principal: &Principal) -> bool {
        !action.required_permissions.is_empty()
            && action
                .required_permissions
                .iter()
                .all(|p| principal.permissions.contains(p))
    }

    /// Try to upgrade to `allow` via a presented token. Returns `None` when
    /// no usable token was presented (caller falls through to the tier's
    /// default rule).
    fn check_token(
        &self,
        action: &ActionRequest,
        token: Option<&str>,
        min_approvers: usize,
        now: DateTime<Utc>,
    ) -> Option<PolicyDecision> {
        let token = token?;
        match self.tokens.consume(token, &action.name, min_approvers, now) {
            TokenStatus::Valid { approvers } => Some({
                let mut d = PolicyDecision::new(&action.name, Decision::Allow, now)
                    .with_reason(format!("approved by {}", approvers.join(", ")));
                d.approval_token = Some(token.to_string());
                d
            }),
            TokenStatus::InsufficientApprovers { held } => {
                warn!(
                    action = %action.name,
                    approvers = held,
                    required = min_approvers,
                    "approval token lacks required chain"
                );
                None
            }
            TokenStatus::FutureDated => {
                warn!(action = %action.name, "rejected future-dated approval token");
                None
            }
            TokenStatus::Expired | TokenStatus::Unknown | TokenStatus::Spent
            | TokenStatus::WrongScope => None,
        }
    }

    /// Explicit rejection path: revoke a token and append a `deny` decision
    /// event keyed by workflow/task.
    ///
    /// Returns `Ok(false)` — not an error — when the token is unknown, so a
    /// failed lookup still leaves a complete audit trail. Only an event-log
    /// write failure propagates as an error.
    pub async fn deny_action(
        &self,
        log: &dyn EventLog,
        workflow_id: &str,
        task_id: &str,
        token: &str,
        actor: &str,
        reason: &str,
    ) -> KernelResult<bool> {
        let revoked = self.tokens.revoke(token);
        if !revoked {
            warn!(workflow_id, task_id, "deny_action on unknown token");
        }

        let now = Utc::now();
        let decision = PolicyDecision::new(format!("deny:{task_id}"), Decision::Deny, now)
            .with_reason(reason);
        let event = GovEvent::new(event_kinds::POLICY_DECISION, workflow_id, now)
            .with_task(task_id)
            .with_data(serde_json::to_value(&decision)?)
            .with_metadata(json!({ "actor": actor, "token_found": revoked }));
        log.append(event).await?;
        Ok(revoked)
    }
}

impl Default for PolicyGuard {
    fn default() -> Self {
        Self::new(TokenStore::new())
    }
}

//! Approval token bookkeeping.
//!
//! Tokens are the only state the policy guard keeps between calls. The store
//! is an explicit, injected value — never a module-level singleton — so
//! multiple guards can coexist in tests. Issuance and consumption of the same
//! token are atomic under one lock: a token can upgrade exactly one decision.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored approval token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token: String,
    /// The action name this token approves.
    pub scope: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Approvers who signed off, in order. A Critical action needs the full
    /// escalation chain here.
    pub approvers: Vec<String>,
    pub consumed: bool,
    pub revoked: bool,
}

/// Why a presented token did not upgrade a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// Usable; carries the approvers who signed off.
    Valid { approvers: Vec<String> },
    /// Not in the store at all.
    Unknown,
    /// Past `expires_at` — treated as absent.
    Expired,
    /// `issued_at` is in the future of the evaluation clock. Forged or
    /// skewed timestamp; rejected outright as a security control.
    FutureDated,
    /// Usable, but carries fewer approvers than the action requires. Not
    /// consumed — it may still cover a lower-tier action.
    InsufficientApprovers { held: usize },
    /// Already consumed or revoked.
    Spent,
    /// Issued for a different action.
    WrongScope,
}

/// In-memory approval token store.
#[derive(Debug, Default)]
pub struct TokenStore {
    tokens: Mutex<HashMap<String, TokenRecord>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a single-approver token scoped to one action.
    pub fn issue(
        &self,
        scope: impl Into<String>,
        approver: impl Into<String>,
        ttl_secs: i64,
        now: DateTime<Utc>,
    ) -> TokenRecord {
        self.insert(scope.into(), vec![approver.into()], ttl_secs, now)
    }

    /// Issue a token carrying a full approval chain (for Critical actions).
    pub fn issue_chain(
        &self,
        scope: impl Into<String>,
        approvers: Vec<String>,
        ttl_secs: i64,
        now: DateTime<Utc>,
    ) -> TokenRecord {
        self.insert(scope.into(), approvers, ttl_secs, now)
    }

    fn insert(
        &self,
        scope: String,
        approvers: Vec<String>,
        ttl_secs: i64,
        now: DateTime<Utc>,
    ) -> TokenRecord {
        let record = TokenRecord {
            token: Uuid::new_v4().to_string(),
            scope,
            issued_at: now,
            expires_at: now + Duration::seconds(ttl_secs),
            approvers,
            consumed: false,
            revoked: false,
        };
        let mut tokens = self.tokens.lock().unwrap();
        tokens.insert(record.token.clone(), record.clone());
        record
    }

    /// Atomically check a token against a scope and approver requirement
    /// and, if usable, mark it consumed. The check-and-consume happens under
    /// one lock so the same token can never upgrade two decisions. A token
    /// whose chain is too short for `min_approvers` is left unconsumed — it
    /// may still legitimately cover a lower-tier action.
    pub fn consume(
        &self,
        token: &str,
        scope: &str,
        min_approvers: usize,
        now: DateTime<Utc>,
    ) -> TokenStatus {
        let mut tokens = self.tokens.lock().unwrap();
        let Some(record) = tokens.get_mut(token) else {
            return TokenStatus::Unknown;
        };
        if record.issued_at > now {
            return TokenStatus::FutureDated;
        }
        if record.consumed || record.revoked {
            return TokenStatus::Spent;
        }
        if now > record.expires_at {
            return TokenStatus::Expired;
        }
        if record.scope != scope {
            return TokenStatus::WrongScope;
        }
        if record.approvers.len() < min_approvers {
            return TokenStatus::InsufficientApprovers {
                held: record.approvers.len(),
            };
        }
        record.consumed = true;
        TokenStatus::Valid {
            approvers: record.approvers.clone(),
        }
    }

    /// Revoke a token. Returns `false` when the token is unknown — the
    /// caller still records the rejection so the audit trail stays complete.
    pub fn revoke(&self, token: &str) -> bool {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.get_mut(token) {
            Some(record) => {
                record.revoked = true;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_marks_token_spent() {
        let store = TokenStore::new();
        let now = Utc::now();
        let record = store.issue("deploy", "alice", 300, now);

        let first = store.consume(&record.token, "deploy", 1, now);
        assert!(matches!(first, TokenStatus::Valid { .. }));
        let second = store.consume(&record.token, "deploy", 1, now);
        assert_eq!(second, TokenStatus::Spent);
    }

    #[test]
    fn test_short_chain_is_not_consumed() {
        let store = TokenStore::new();
        let now = Utc::now();
        let record = store.issue("deploy", "alice", 300, now);

        assert_eq!(
            store.consume(&record.token, "deploy", 2, now),
            TokenStatus::InsufficientApprovers { held: 1 }
        );
        // The failed chain check did not burn the token.
        assert!(matches!(
            store.consume(&record.token, "deploy", 1, now),
            TokenStatus::Valid { .. }
        ));
    }

    #[test]
    fn test_expired_token() {
        let store = TokenStore::new();
        let now = Utc::now();
        let record = store.issue("deploy", "alice", 300, now);
        let later = now + Duration::seconds(301);
        assert_eq!(
            store.consume(&record.token, "deploy", 1, later),
            TokenStatus::Expired
        );
    }

    #[test]
    fn test_future_dated_token_rejected() {
        let store = TokenStore::new();
        let now = Utc::now();
        let record = store.issue("deploy", "alice", 300, now + Duration::seconds(60));
        assert_eq!(
            store.consume(&record.token, "deploy", 1, now),
            TokenStatus::FutureDated
        );
    }

    #[test]
    fn test_wrong_scope() {
        let store = TokenStore::new();
        let now = Utc::now();
        let record = store.issue("deploy", "alice", 300, now);
        assert_eq!(
            store.consume(&record.token, "delete-db", 1, now),
            TokenStatus::WrongScope
        );
    }

    #[test]
    fn test_revoke_unknown_token_is_soft() {
        let store = TokenStore::new();
        assert!(!store.revoke("nope"));
    }

    #[test]
    fn test_chain_token_carries_approvers() {
        let store = TokenStore::new();
        let now = Utc::now();
        let record = store.issue_chain(
            "drop-table",
            vec!["senior".into(), "lead".into(), "director".into()],
            600,
            now,
        );
        let TokenStatus::Valid { approvers } =
            store.consume(&record.token, "drop-table", 2, now)
        else {
            panic!("expected valid");
        };
        assert_eq!(approvers.len(), 3);
    }
}

//! Risk-tiered policy approval.
//!
//! The [`PolicyGuard`] answers one question per call — may this principal
//! perform this action — from a fixed rule table over risk tiers, with no
//! state carried between calls except issued approval tokens:
//!
//! - **Low** — allow.
//! - **Medium** — allow unless an explicit deny rule matches.
//! - **High** — requires approval unless the principal holds every required
//!   permission.
//! - **Critical** — always requires a multi-party approval chain; permissions
//!   alone never auto-approve it.
//!
//! A `deny` or `requires_approval` decision is a successful, expected outcome
//! — never an error.

pub mod decision;
pub mod guard;
pub mod tokens;

pub use decision::{ActionRequest, Decision, PolicyDecision};
pub use guard::PolicyGuard;
pub use tokens::{TokenRecord, TokenStore};

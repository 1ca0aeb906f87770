//! Commit-Review-Validate (CRV) gating.
//!
//! A [`CrvGate`] owns an ordered list of tagged, pure validator functions
//! and runs all of them against a [`crate::domain::Commit`], aggregating into
//! a [`GateOutcome`]: `passed` is the conjunction of every result, and the
//! gate's confidence is the *minimum* across results — a single weak signal
//! must not be masked by strong ones.
//!
//! Failures are data, never errors; only a validator that faults internally
//! propagates as `KernelError::ValidatorFault`.

pub mod gate;
pub mod result;
pub mod validators;

pub use gate::{CrvGate, GateOutcome, NamedResult};
pub use result::{FailureCode, ValidationResult};
pub use validators::Validator;

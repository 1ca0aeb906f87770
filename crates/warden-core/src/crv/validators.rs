//! Tagged validator functions and built-in constructors.
//!
//! A validator is a named, pure function over a commit. The built-ins cover
//! the common checks a gate is assembled from; bespoke validators are just
//! closures passed to [`Validator::new`].

use std::sync::Arc;

use serde_json::Value;

use crate::domain::Commit;
use crate::error::KernelResult;

use super::result::{FailureCode, ValidationResult};

/// The check signature: pure, side-effect free, and independent of every
/// other validator. An `Err` models an internal fault (the validator
/// "threw"), which the gate propagates; an invalid result is ordinary data.
pub type CheckFn = dyn Fn(&Commit) -> KernelResult<ValidationResult> + Send + Sync;

/// A named validator function.
#[derive(Clone)]
pub struct Validator {
    pub name: String,
    check: Arc<CheckFn>,
}

impl Validator {
    pub fn new(
        name: impl Into<String>,
        check: impl Fn(&Commit) -> KernelResult<ValidationResult> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Run the check against a commit.
    pub fn run(&self, commit: &Commit) -> KernelResult<ValidationResult> {
        (self.check)(commit)
    }

    // -- Built-in constructors ----------------------------------------------

    /// Fails with `MISSING_DATA` when `commit.data` is not an object
    /// containing every listed top-level field.
    pub fn required_fields(name: impl Into<String>, fields: &[&str]) -> Self {
        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        Self::new(name, move |commit| {
            let Some(obj) = commit.data.as_object() else {
                return Ok(ValidationResult::fail(
                    FailureCode::SchemaMismatch,
                    1.0,
                    "commit data is not an object",
                ));
            };
            let missing: Vec<&str> = fields
                .iter()
                .filter(|f| !obj.contains_key(f.as_str()))
                .map(String::as_str)
                .collect();
            if missing.is_empty() {
                Ok(ValidationResult::pass(1.0, "all required fields present"))
            } else {
                Ok(ValidationResult::fail(
                    FailureCode::MissingData,
                    1.0,
                    format!("missing required fields: {}", missing.join(", ")),
                ))
            }
        })
    }

    /// Fails with `MISSING_DATA` when `commit.data` is null, an empty
    /// object, an empty array, or an empty string.
    pub fn non_empty_data(name: impl Into<String>) -> Self {
        Self::new(name, |commit| {
            let empty = match &commit.data {
                Value::Null => true,
                Value::Object(map) => map.is_empty(),
                Value::Array(items) => items.is_empty(),
                Value::String(s) => s.is_empty(),
                _ => false,
            };
            if empty {
                Ok(ValidationResult::fail(
                    FailureCode::MissingData,
                    1.0,
                    "commit carries no data",
                ))
            } else {
                Ok(ValidationResult::pass(1.0, "commit has data"))
            }
        })
    }

    /// Fails with `CONFLICT` when a top-level key present in
    /// `previous_state` disappears from `data`. Commits without a previous
    /// state pass trivially.
    pub fn backward_compatible(name: impl Into<String>) -> Self {
        Self::new(name, |commit| {
            let (Some(prev), Some(curr)) = (
                commit.previous_state.as_ref().and_then(Value::as_object),
                commit.data.as_object(),
            ) else {
                return Ok(ValidationResult::pass(
                    1.0,
                    "no previous state to compare against",
                ));
            };
            let dropped: Vec<&str> = prev
                .keys()
                .filter(|k| !curr.contains_key(*k))
                .map(String::as_str)
                .collect();
            if dropped.is_empty() {
                Ok(ValidationResult::pass(1.0, "backward compatible"))
            } else {
                Ok(ValidationResult::fail(
                    FailureCode::Conflict,
                    1.0,
                    format!("fields dropped from previous state: {}", dropped.join(", ")),
                ))
            }
        })
    }

    /// Fails with `POLICY_VIOLATION` when the commit's actor is empty.
    pub fn actor_present(name: impl Into<String>) -> Self {
        Self::new(name, |commit| {
            if commit.metadata.actor.trim().is_empty() {
                Ok(ValidationResult::fail(
                    FailureCode::PolicyViolation,
                    1.0,
                    "commit has no attributable actor",
                ))
            } else {
                Ok(ValidationResult::pass(1.0, "actor attributed"))
            }
        })
    }

    /// Reads a numeric `confidence` field from the commit data and fails
    /// with `LOW_CONFIDENCE` when it is below `floor`. Absent field counts
    /// as zero.
    pub fn confidence_floor(name: impl Into<String>, floor: f64) -> Self {
        Self::new(name, move |commit| {
            let confidence = commit
                .data
                .get("confidence")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            if confidence < floor {
                Ok(ValidationResult::fail(
                    FailureCode::LowConfidence,
                    confidence,
                    format!("reported confidence {confidence:.2} below floor {floor:.2}"),
                ))
            } else {
                Ok(ValidationResult::pass(confidence, "confidence acceptable"))
            }
        })
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn commit(data: Value) -> Commit {
        Commit::new("c-1", "state/key", data, "agent-7", "test")
    }

    #[test]
    fn test_required_fields() {
        let v = Validator::required_fields("schema", &["name", "version"]);
        let ok = v.run(&commit(json!({"name": "x", "version": 1}))).unwrap();
        assert!(ok.valid);

        let bad = v.run(&commit(json!({"name": "x"}))).unwrap();
        assert!(!bad.valid);
        assert_eq!(bad.failure_code, Some(FailureCode::MissingData));
        assert!(bad.reason.contains("version"));
    }

    #[test]
    fn test_required_fields_on_non_object() {
        let v = Validator::required_fields("schema", &["name"]);
        let bad = v.run(&commit(json!("just a string"))).unwrap();
        assert_eq!(bad.failure_code, Some(FailureCode::SchemaMismatch));
    }

    #[test]
    fn test_non_empty_data() {
        let v = Validator::non_empty_data("payload");
        assert!(!v.run(&commit(json!(null))).unwrap().valid);
        assert!(!v.run(&commit(json!({}))).unwrap().valid);
        assert!(!v.run(&commit(json!([]))).unwrap().valid);
        assert!(v.run(&commit(json!({"k": 1}))).unwrap().valid);
        assert!(v.run(&commit(json!(0))).unwrap().valid);
    }

    #[test]
    fn test_backward_compatible() {
        let v = Validator::backward_compatible("compat");
        let c = commit(json!({"a": 1}))
            .with_previous_state(json!({"a": 0, "b": 2}));
        let res = v.run(&c).unwrap();
        assert!(!res.valid);
        assert_eq!(res.failure_code, Some(FailureCode::Conflict));
        assert!(res.reason.contains('b'));

        let fresh = commit(json!({"a": 1}));
        assert!(v.run(&fresh).unwrap().valid);
    }

    #[test]
    fn test_actor_present() {
        let v = Validator::actor_present("attribution");
        assert!(v.run(&commit(json!({}))).unwrap().valid);

        let anonymous = Commit::new("c-2", "k", json!({}), "  ", "test");
        let res = v.run(&anonymous).unwrap();
        assert_eq!(res.failure_code, Some(FailureCode::PolicyViolation));
    }

    #[test]
    fn test_confidence_floor() {
        let v = Validator::confidence_floor("confidence", 0.8);
        let low = v.run(&commit(json!({"confidence": 0.5}))).unwrap();
        assert!(!low.valid);
        assert_eq!(low.failure_code, Some(FailureCode::LowConfidence));

        let high = v.run(&commit(json!({"confidence": 0.9}))).unwrap();
        assert!(high.valid);
        assert!((high.confidence - 0.9).abs() < 1e-9);

        let absent = v.run(&commit(json!({}))).unwrap();
        assert!(!absent.valid);
    }
}

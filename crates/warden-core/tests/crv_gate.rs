//! Integration tests for CRV gate aggregation and blocking semantics.

use serde_json::json;

use warden_core::{Commit, CrvGate, FailureCode, KernelError, ValidationResult, Validator};

fn commit(data: serde_json::Value) -> Commit {
    Commit::new("c-int", "state/config", data, "agent-12", "integration test")
}

#[test]
fn blocking_gate_blocks_on_any_single_failure() {
    let gate = CrvGate::new("release-gate")
        .with_validator(Validator::required_fields("shape", &["version", "artifacts"]))
        .with_validator(Validator::non_empty_data("payload"))
        .with_validator(Validator::actor_present("attribution"))
        .blocking();

    let bad = commit(json!({"version": "1.2.3"}));
    let outcome = gate.validate(&bad).unwrap();
    assert!(!outcome.passed);
    assert!(outcome.blocked_commit);
    assert_eq!(outcome.results.len(), 3, "every validator still runs");

    let good = commit(json!({"version": "1.2.3", "artifacts": ["a.tar"]}));
    let outcome = gate.validate(&good).unwrap();
    assert!(outcome.passed);
    assert!(!outcome.blocked_commit);
}

#[test]
fn non_blocking_gate_reports_without_blocking() {
    let gate = CrvGate::new("advisory-gate").with_validator(Validator::non_empty_data("payload"));
    let outcome = gate.validate(&commit(json!({}))).unwrap();
    assert!(!outcome.passed);
    assert!(!outcome.blocked_commit, "blockOnFailure was not configured");
}

// ── Scenario: single validator at 0.95, minConfidence 0.99 ──

#[test]
fn min_confidence_fails_gate_despite_valid_results() {
    let gate = CrvGate::new("confidence-gate")
        .with_validator(Validator::new("optimist", |_| {
            Ok(ValidationResult::pass(0.95, "looks fine"))
        }))
        .with_min_confidence(0.99);

    let outcome = gate.validate(&commit(json!({"k": 1}))).unwrap();
    assert!(!outcome.passed);
    assert!((outcome.confidence - 0.95).abs() < 1e-9);
    let floor_result = outcome.results.last().unwrap();
    assert_eq!(
        floor_result.result.failure_code,
        Some(FailureCode::LowConfidence)
    );
}

#[test]
fn aggregate_confidence_is_weakest_signal() {
    let gate = CrvGate::new("mixed")
        .with_validator(Validator::new("sure", |_| Ok(ValidationResult::pass(1.0, "certain"))))
        .with_validator(Validator::new("unsure", |_| {
            Ok(ValidationResult::pass(0.55, "plausible"))
        }));
    let outcome = gate.validate(&commit(json!({"k": 1}))).unwrap();
    assert!((outcome.confidence - 0.55).abs() < 1e-9);
}

#[test]
fn backward_compat_validator_flags_dropped_fields() {
    let gate = CrvGate::new("compat-gate")
        .with_validator(Validator::backward_compatible("compat"))
        .blocking();

    let regressive = commit(json!({"max_qps": 100}))
        .with_previous_state(json!({"max_qps": 50, "region": "us-east"}));
    let outcome = gate.validate(&regressive).unwrap();
    assert!(outcome.blocked_commit);
    assert!(outcome.failure_reason().unwrap().contains("region"));
}

#[test]
fn failure_codes_classify_without_string_matching() {
    let gate = CrvGate::new("taxonomy")
        .with_validator(Validator::required_fields("shape", &["id"]))
        .with_validator(Validator::actor_present("attribution"));

    let anonymous = Commit::new("c-2", "k", json!({}), "", "no actor");
    let outcome = gate.validate(&anonymous).unwrap();
    let codes: Vec<FailureCode> = outcome
        .results
        .iter()
        .filter_map(|r| r.result.failure_code)
        .collect();
    assert!(codes.contains(&FailureCode::MissingData));
    assert!(codes.contains(&FailureCode::PolicyViolation));
}

#[test]
fn validator_fault_is_an_error_not_a_failure() {
    let gate = CrvGate::new("faulting").with_validator(Validator::new("panicky", |_| {
        Err(KernelError::InvalidSpec("collaborator bug".into()))
    }));
    let err = gate.validate(&commit(json!({"k": 1}))).unwrap_err();
    let KernelError::ValidatorFault { validator, .. } = err else {
        panic!("expected validator fault, got {err}");
    };
    assert_eq!(validator, "panicky");
}

#[test]
fn gate_outcome_embeds_in_event_data() {
    let gate = CrvGate::new("serializable").with_validator(Validator::non_empty_data("payload"));
    let outcome = gate.validate(&commit(json!({"k": 1}))).unwrap();
    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["gate_name"], "serializable");
    assert_eq!(value["passed"], true);
    assert!(value["results"].is_array());
}

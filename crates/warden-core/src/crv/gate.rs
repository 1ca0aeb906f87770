//! The CRV gate — runs all validators and aggregates their verdicts.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Commit;
use crate::error::{KernelError, KernelResult};

use super::result::{FailureCode, ValidationResult};
use super::validators::Validator;

/// One validator's result, tagged with its name for the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedResult {
    pub validator: String,
    #[serde(flatten)]
    pub result: ValidationResult,
}

/// The aggregated verdict of a gate over one commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateOutcome {
    pub gate_name: String,
    /// Conjunction of every validator's `valid`, and the min-confidence
    /// check when the gate declares one.
    pub passed: bool,
    /// Minimum confidence across results — a single weak signal is never
    /// masked by strong ones.
    pub confidence: f64,
    pub results: Vec<NamedResult>,
    /// Set when the gate is configured to block and the commit failed; the
    /// caller must treat the corresponding action as blocked, not merely
    /// logged.
    pub blocked_commit: bool,
}

impl GateOutcome {
    /// Human-readable summary of why the gate failed, drawn from the first
    /// failing result. Empty when passed.
    pub fn failure_reason(&self) -> Option<&str> {
        self.results
            .iter()
            .find(|r| !r.result.valid)
            .map(|r| r.result.reason.as_str())
    }
}

/// A configured gate: an ordered set of validators plus blocking policy.
pub struct CrvGate {
    name: String,
    validators: Vec<Validator>,
    block_on_failure: bool,
    min_confidence: Option<f64>,
}

impl CrvGate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            validators: Vec::new(),
            block_on_failure: false,
            min_confidence: None,
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// When set, a failed commit is marked `blocked_commit` and the caller
    /// must block the corresponding action.
    pub fn blocking(mut self) -> Self {
        self.block_on_failure = true;
        self
    }

    /// Reject even fully valid result sets whose aggregate confidence falls
    /// below this threshold — graceful rejection of low-confidence outputs.
    pub fn with_min_confidence(mut self, threshold: f64) -> Self {
        self.min_confidence = Some(threshold.clamp(0.0, 1.0));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validate a commit against every validator.
    ///
    /// All validators run — they are independent and there is no
    /// short-circuit; the aggregate is computed only after every result has
    /// settled. An empty gate passes with confidence 1.0.
    ///
    /// # Errors
    ///
    /// Propagates the first validator fault (`KernelError::ValidatorFault`);
    /// invalid results are not faults.
    pub fn validate(&self, commit: &Commit) -> KernelResult<GateOutcome> {
        let mut results = Vec::with_capacity(self.validators.len());
        for validator in &self.validators {
            let result = validator.run(commit).map_err(|err| match err {
                fault @ KernelError::ValidatorFault { .. } => fault,
                other => KernelError::ValidatorFault {
                    validator: validator.name.clone(),
                    message: other.to_string(),
                },
            })?;
            results.push(NamedResult {
                validator: validator.name.clone(),
                result,
            });
        }

        let all_valid = results.iter().all(|r| r.result.valid);
        let confidence = results
            .iter()
            .map(|r| r.result.confidence)
            .fold(1.0_f64, f64::min);

        let mut passed = all_valid;
        let mut results = results;
        if let Some(floor) = self.min_confidence {
            if passed && confidence < floor {
                passed = false;
                results.push(NamedResult {
                    validator: format!("{}:min_confidence", self.name),
                    result: ValidationResult::fail(
                        FailureCode::LowConfidence,
                        confidence,
                        format!(
                            "aggregate confidence {confidence:.2} below gate threshold {floor:.2}"
                        ),
                    ),
                });
            }
        }

        let blocked_commit = self.block_on_failure && !passed;
        debug!(
            gate = %self.name,
            commit = %commit.id,
            passed,
            confidence,
            blocked_commit,
            "gate evaluated"
        );

        Ok(GateOutcome {
            gate_name: self.name.clone(),
            passed,
            confidence,
            results,
            blocked_commit,
        })
    }
}

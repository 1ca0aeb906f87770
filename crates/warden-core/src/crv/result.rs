//! Validation result types and the failure taxonomy.

use serde::{Deserialize, Serialize};

/// Closed failure taxonomy for CRV results.
///
/// Downstream tooling classifies outcomes by these codes instead of
/// string-matching reasons; the set is a wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCode {
    MissingData,
    Conflict,
    PolicyViolation,
    LowConfidence,
    SchemaMismatch,
    StaleState,
}

impl std::fmt::Display for FailureCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MissingData => "MISSING_DATA",
            Self::Conflict => "CONFLICT",
            Self::PolicyViolation => "POLICY_VIOLATION",
            Self::LowConfidence => "LOW_CONFIDENCE",
            Self::SchemaMismatch => "SCHEMA_MISMATCH",
            Self::StaleState => "STALE_STATE",
        };
        write!(f, "{s}")
    }
}

/// The verdict of one validator over one commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// Confidence in the verdict, clamped to `[0, 1]`.
    pub confidence: f64,
    pub reason: String,
    pub failure_code: Option<FailureCode>,
}

impl ValidationResult {
    /// A passing result with the given confidence.
    pub fn pass(confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            valid: true,
            confidence: confidence.clamp(0.0, 1.0),
            reason: reason.into(),
            failure_code: None,
        }
    }

    /// A failing result carrying a taxonomy code.
    pub fn fail(code: FailureCode, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            confidence: confidence.clamp(0.0, 1.0),
            reason: reason.into(),
            failure_code: Some(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(ValidationResult::pass(1.7, "ok").confidence, 1.0);
        assert_eq!(
            ValidationResult::fail(FailureCode::Conflict, -0.3, "bad").confidence,
            0.0
        );
    }

    #[test]
    fn test_failure_code_wire_format() {
        let json = serde_json::to_string(&FailureCode::MissingData).unwrap();
        assert_eq!(json, "\"MISSING_DATA\"");
        let json = serde_json::to_string(&FailureCode::LowConfidence).unwrap();
        assert_eq!(json, "\"LOW_CONFIDENCE\"");
    }

    #[test]
    fn test_display_matches_wire_format() {
        for code in [
            FailureCode::MissingData,
            FailureCode::Conflict,
            FailureCode::PolicyViolation,
            FailureCode::LowConfidence,
            FailureCode::SchemaMismatch,
            FailureCode::StaleState,
        ] {
            let wire: String = serde_json::to_value(code).unwrap().as_str().unwrap().into();
            assert_eq!(wire, code.to_string());
        }
    }
}

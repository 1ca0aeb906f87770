//! Simulation result types.
//!
//! All collections are append-only while a run executes and are returned to
//! the caller as one immutable snapshot; the kernel keeps no reference to a
//! result after returning it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crv::GateOutcome;
use crate::policy::PolicyDecision;

/// Status of one trace step. Closed vocabulary, wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Blocked,
    Simulated,
    Executed,
}

/// Status of one tool call. Closed vocabulary, wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Executed,
    Simulated,
    Blocked,
}

/// One entry in the causal execution trace. Step numbers are strictly
/// increasing within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    pub step: u32,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub status: StepStatus,
    pub tool: Option<String>,
    pub block_reason: Option<String>,
}

/// One tool invocation (real, simulated, or blocked).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub status: ToolCallStatus,
    pub inputs: Value,
    pub outputs: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

/// One CRV check outcome recorded during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrvOutcome {
    pub check_name: String,
    pub passed: bool,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

impl CrvOutcome {
    /// Fold a gate outcome into the recorded form, under a caller-chosen
    /// check name.
    pub fn from_gate(check_name: impl Into<String>, outcome: &GateOutcome, now: DateTime<Utc>) -> Self {
        Self {
            check_name: check_name.into(),
            passed: outcome.passed,
            confidence: outcome.confidence,
            timestamp: now,
            reason: outcome.failure_reason().map(str::to_string),
        }
    }
}

/// A unit of work prevented from completing, always with a reason —
/// silent blocking is forbidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedStep {
    pub tool: String,
    pub reason: String,
}

/// A side effect a tool produced or would have produced. Recorded with
/// `captured = true` even in dry runs — the ledger must surface what would
/// have happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideEffectRecord {
    pub effect_type: String,
    pub captured: bool,
    pub detail: String,
}

/// The aggregated outcome of one simulation run. Owned exclusively by the
/// caller once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub success: bool,
    pub execution_time_ms: u64,
    pub trace: Vec<TraceStep>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub policy_decisions: Vec<PolicyDecision>,
    pub crv_outcomes: Vec<CrvOutcome>,
    pub blocked_steps: Vec<BlockedStep>,
    pub side_effects: Vec<SideEffectRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_formats() {
        assert_eq!(
            serde_json::to_string(&StepStatus::Blocked).unwrap(),
            "\"blocked\""
        );
        assert_eq!(
            serde_json::to_string(&ToolCallStatus::Simulated).unwrap(),
            "\"simulated\""
        );
        assert_eq!(
            serde_json::to_string(&ToolCallStatus::Executed).unwrap(),
            "\"executed\""
        );
    }

    #[test]
    fn test_result_serde_roundtrip() {
        let result = SimulationResult {
            success: true,
            execution_time_ms: 12,
            trace: vec![TraceStep {
                step: 1,
                timestamp: Utc::now(),
                action: "Blueprint Creation".into(),
                status: StepStatus::Completed,
                tool: None,
                block_reason: None,
            }],
            tool_calls: Vec::new(),
            policy_decisions: Vec::new(),
            crv_outcomes: Vec::new(),
            blocked_steps: vec![BlockedStep {
                tool: "deploy".into(),
                reason: "High-risk tool blocked in dry-run".into(),
            }],
            side_effects: Vec::new(),
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: SimulationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}

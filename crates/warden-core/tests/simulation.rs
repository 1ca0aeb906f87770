//! End-to-end simulation engine tests: dry-run blocking, side-effect
//! capture, sandbox execution with CRV gating, and audit event emission.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use warden_core::{
    event_kinds, AgentBlueprint, EngineConfig, EventLog, KernelResult, MemoryEventLog, Principal,
    RiskTier, SandboxAdapter, SimulationEngine, SimulationRequest, TaskSpec, TestScenario,
    ToolCallStatus, ToolDescriptor, WorkflowSpec,
};

/// Sandbox fake that returns a canned output per tool name, or a marker
/// object for unknown tools.
struct ScriptedSandbox {
    outputs: BTreeMap<String, Value>,
}

impl ScriptedSandbox {
    fn new(outputs: &[(&str, Value)]) -> Self {
        Self {
            outputs: outputs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl SandboxAdapter for ScriptedSandbox {
    async fn execute(&self, tool: &ToolDescriptor, inputs: &Value) -> KernelResult<Value> {
        Ok(self
            .outputs
            .get(&tool.name)
            .cloned()
            .unwrap_or_else(|| json!({"ran": tool.name, "inputs": inputs})))
    }
}

fn blueprint(risk_profile: RiskTier, tools: Vec<ToolDescriptor>) -> AgentBlueprint {
    let now = Utc::now();
    let mut bp = AgentBlueprint::new("bp-sim", "Release Agent", "ship the release", risk_profile, now);
    for tool in tools {
        bp = bp.with_tool(tool);
    }
    bp
}

fn request(bp: AgentBlueprint, dry_run: bool) -> SimulationRequest {
    SimulationRequest {
        blueprint: bp,
        scenario: TestScenario::new(
            "release-check",
            Principal::new("release-bot"),
            json!({"target": "prod"}),
        ),
        dry_run,
    }
}

// ── Scenario: CRITICAL side-effect tool, dry run ──

#[tokio::test]
async fn dry_run_blocks_critical_tool() {
    let engine = SimulationEngine::new(Arc::new(MemoryEventLog::new()));
    let bp = blueprint(
        RiskTier::Low,
        vec![ToolDescriptor::new("t-deploy", "deploy-prod", RiskTier::Critical, true)],
    );
    let result = engine.simulate_agent(request(bp, true)).await.unwrap();

    assert_eq!(result.tool_calls.len(), 1);
    assert_eq!(result.tool_calls[0].status, ToolCallStatus::Blocked);
    assert_eq!(result.blocked_steps.len(), 1);
    assert_eq!(result.blocked_steps[0].tool, "deploy-prod");
    assert!(result.blocked_steps[0]
        .reason
        .contains("High-risk tool blocked"));
    // Never executed or simulated: no side effect, no outputs.
    assert!(result.side_effects.is_empty());
    assert!(result.tool_calls[0].outputs.is_none());
}

#[tokio::test]
async fn dry_run_blocks_high_tool_under_default_cutoff() {
    let engine = SimulationEngine::new(Arc::new(MemoryEventLog::new()));
    let bp = blueprint(
        RiskTier::Low,
        vec![ToolDescriptor::new("t-migrate", "migrate-schema", RiskTier::High, true)],
    );
    let result = engine.simulate_agent(request(bp, true)).await.unwrap();
    assert_eq!(result.tool_calls[0].status, ToolCallStatus::Blocked);
}

// ── Scenario: LOW side-effect tool, dry run, no sandbox ──

#[tokio::test]
async fn dry_run_simulates_low_tool_and_captures_side_effect() {
    let engine = SimulationEngine::new(Arc::new(MemoryEventLog::new()));
    let bp = blueprint(
        RiskTier::Low,
        vec![ToolDescriptor::new("t-notify", "notify-slack", RiskTier::Low, true)],
    );
    let result = engine.simulate_agent(request(bp, true)).await.unwrap();

    assert_eq!(result.tool_calls[0].status, ToolCallStatus::Simulated);
    assert_eq!(result.side_effects.len(), 1);
    assert!(result.side_effects[0].captured);
    assert!(result.side_effects[0].detail.contains("notify-slack"));
    assert!(result.blocked_steps.is_empty());
}

#[tokio::test]
async fn pure_tool_records_no_side_effect() {
    let engine = SimulationEngine::new(Arc::new(MemoryEventLog::new()));
    let bp = blueprint(
        RiskTier::Low,
        vec![ToolDescriptor::new("t-lint", "lint", RiskTier::Low, false)],
    );
    let result = engine.simulate_agent(request(bp, true)).await.unwrap();
    assert_eq!(result.tool_calls[0].status, ToolCallStatus::Simulated);
    assert!(result.side_effects.is_empty());
}

// ── Legacy-compatibility mode: no sandbox, not a dry run ──

#[tokio::test]
async fn missing_sandbox_degrades_to_simulation_without_error() {
    let engine = SimulationEngine::new(Arc::new(MemoryEventLog::new()));
    let bp = blueprint(
        RiskTier::Low,
        vec![ToolDescriptor::new("t-fetch", "fetch-data", RiskTier::Low, false)],
    );
    let result = engine.simulate_agent(request(bp, false)).await.unwrap();
    assert_eq!(result.tool_calls[0].status, ToolCallStatus::Simulated);
    let outputs = result.tool_calls[0].outputs.as_ref().unwrap();
    assert_eq!(outputs["simulated"], true);
}

// ── Real execution through the sandbox ──

#[tokio::test]
async fn sandbox_executes_and_gates_tool_output() {
    let sandbox = ScriptedSandbox::new(&[("fetch-data", json!({"rows": 42}))]);
    let engine = SimulationEngine::new(Arc::new(MemoryEventLog::new()))
        .with_sandbox(Arc::new(sandbox));
    let bp = blueprint(
        RiskTier::Low,
        vec![ToolDescriptor::new("t-fetch", "fetch-data", RiskTier::Low, false)],
    );
    let result = engine.simulate_agent(request(bp, false)).await.unwrap();

    assert_eq!(result.tool_calls[0].status, ToolCallStatus::Executed);
    assert_eq!(result.tool_calls[0].outputs.as_ref().unwrap()["rows"], 42);

    let check = result
        .crv_outcomes
        .iter()
        .find(|o| o.check_name == "Tool Output Validation: fetch-data")
        .expect("output validation recorded");
    assert!(check.passed);
}

#[tokio::test]
async fn crv_gate_blocks_empty_sandbox_output() {
    // The default output gate requires non-empty output.
    let sandbox = ScriptedSandbox::new(&[("flaky-tool", json!({}))]);
    let engine = SimulationEngine::new(Arc::new(MemoryEventLog::new()))
        .with_sandbox(Arc::new(sandbox));
    let bp = blueprint(
        RiskTier::Low,
        vec![ToolDescriptor::new("t-flaky", "flaky-tool", RiskTier::Low, true)],
    );
    let result = engine.simulate_agent(request(bp, false)).await.unwrap();

    assert_eq!(result.tool_calls[0].status, ToolCallStatus::Blocked);
    assert_eq!(result.blocked_steps.len(), 1);
    assert!(result.blocked_steps[0].reason.contains("CRV"));
    // The gate rejected the output after the fact, but the tool really ran:
    // its real-world side effect stays on the ledger.
    assert_eq!(result.side_effects.len(), 1);
    assert!(result.side_effects[0].captured);
    assert!(result.side_effects[0].detail.contains("flaky-tool"));
}

#[tokio::test]
async fn sandbox_is_bypassed_in_dry_run() {
    let sandbox = ScriptedSandbox::new(&[("fetch-data", json!({"rows": 42}))]);
    let engine = SimulationEngine::new(Arc::new(MemoryEventLog::new()))
        .with_sandbox(Arc::new(sandbox));
    let bp = blueprint(
        RiskTier::Low,
        vec![ToolDescriptor::new("t-fetch", "fetch-data", RiskTier::Low, false)],
    );
    let result = engine.simulate_agent(request(bp, true)).await.unwrap();
    assert_eq!(result.tool_calls[0].status, ToolCallStatus::Simulated);
}

// ── Audit events ──

#[tokio::test]
async fn run_is_bracketed_by_started_and_completed_events() {
    let log = Arc::new(MemoryEventLog::new());
    let engine = SimulationEngine::new(Arc::clone(&log) as Arc<dyn EventLog>);
    let bp = blueprint(
        RiskTier::Low,
        vec![
            ToolDescriptor::new("t-a", "step-a", RiskTier::Low, false),
            ToolDescriptor::new("t-b", "step-b", RiskTier::Low, false),
        ],
    );
    engine.simulate_agent(request(bp, true)).await.unwrap();

    let events = log.read("sim-bp-sim").await.unwrap();
    assert!(events.len() >= 2);
    assert_eq!(events.first().unwrap().kind, event_kinds::SIMULATION_STARTED);
    assert_eq!(
        events.last().unwrap().kind,
        event_kinds::SIMULATION_COMPLETED
    );
    let completed = events.last().unwrap().data.as_ref().unwrap();
    assert_eq!(completed["tool_calls"], 2);
}

#[tokio::test]
async fn denied_tool_decision_reaches_event_log() {
    let log = Arc::new(MemoryEventLog::new());
    let engine = SimulationEngine::new(Arc::clone(&log) as Arc<dyn EventLog>);
    // High-risk tool, principal without permissions, not a dry run.
    let bp = blueprint(
        RiskTier::Low,
        vec![ToolDescriptor::new("t-deploy", "deploy-prod", RiskTier::High, true)],
    );
    let result = engine.simulate_agent(request(bp, false)).await.unwrap();
    assert_eq!(result.tool_calls[0].status, ToolCallStatus::Blocked);

    let events = log.read("sim-bp-sim").await.unwrap();
    let decisions: Vec<_> = events
        .iter()
        .filter(|e| e.kind == event_kinds::POLICY_DECISION)
        .collect();
    assert_eq!(decisions.len(), 1, "the denial itself must be audited");
    let data = decisions[0].data.as_ref().unwrap();
    assert_eq!(data["tool"], "deploy-prod");
    assert_eq!(data["decision"], "requires_approval");
    assert!(data["reason"].as_str().unwrap().contains("approval"));
}

#[tokio::test]
async fn dry_run_block_is_audited() {
    let log = Arc::new(MemoryEventLog::new());
    let engine = SimulationEngine::new(Arc::clone(&log) as Arc<dyn EventLog>);
    let bp = blueprint(
        RiskTier::Low,
        vec![ToolDescriptor::new("t-deploy", "deploy-prod", RiskTier::Critical, true)],
    );
    engine.simulate_agent(request(bp, true)).await.unwrap();

    let events = log.read("sim-bp-sim").await.unwrap();
    let decision = events
        .iter()
        .find(|e| e.kind == event_kinds::POLICY_DECISION)
        .expect("blocked tool must leave an audit event");
    let data = decision.data.as_ref().unwrap();
    assert_eq!(data["decision"], "blocked");
    assert!(data["reason"].as_str().unwrap().contains("dry-run"));
}

// ── Blueprint-level validation and success semantics ──

#[tokio::test]
async fn cyclic_workflow_fails_blueprint_validation() {
    let mut deps = BTreeMap::new();
    deps.insert("a".to_string(), vec!["b".to_string()]);
    deps.insert("b".to_string(), vec!["a".to_string()]);
    let cyclic = WorkflowSpec::new(
        "wf-cyclic",
        "Cyclic",
        vec![
            TaskSpec::new("a", "A", "tool_call", RiskTier::Low),
            TaskSpec::new("b", "B", "tool_call", RiskTier::Low),
        ],
        deps,
    )
    .unwrap();

    let bp = blueprint(RiskTier::Low, vec![]).with_workflow(cyclic);
    let engine = SimulationEngine::new(Arc::new(MemoryEventLog::new()));
    let result = engine.simulate_agent(request(bp, true)).await.unwrap();

    assert!(!result.success);
    let validation = &result.crv_outcomes[0];
    assert_eq!(validation.check_name, "Blueprint Validation");
    assert!(!validation.passed);
    assert!(validation.reason.as_ref().unwrap().contains("cycle"));
}

#[tokio::test]
async fn blocked_tools_do_not_fail_a_run() {
    let engine = SimulationEngine::new(Arc::new(MemoryEventLog::new()));
    let bp = blueprint(
        RiskTier::Low,
        vec![ToolDescriptor::new("t-deploy", "deploy-prod", RiskTier::Critical, true)],
    );
    let result = engine.simulate_agent(request(bp, true)).await.unwrap();
    assert!(result.success, "blocking is a successful governance outcome");
    assert_eq!(result.blocked_steps.len(), 1);
}

#[tokio::test]
async fn mixed_blueprint_keeps_declaration_order_and_causal_trace() {
    let engine = SimulationEngine::new(Arc::new(MemoryEventLog::new())).with_config(EngineConfig {
        dry_run_block_cutoff: RiskTier::High,
    });
    let bp = blueprint(
        RiskTier::Low,
        vec![
            ToolDescriptor::new("t-1", "lint", RiskTier::Low, false),
            ToolDescriptor::new("t-2", "deploy-prod", RiskTier::Critical, true),
            ToolDescriptor::new("t-3", "notify-slack", RiskTier::Low, true),
        ],
    );
    let result = engine.simulate_agent(request(bp, true)).await.unwrap();

    let statuses: Vec<ToolCallStatus> = result.tool_calls.iter().map(|c| c.status).collect();
    assert_eq!(
        statuses,
        vec![
            ToolCallStatus::Simulated,
            ToolCallStatus::Blocked,
            ToolCallStatus::Simulated
        ]
    );
    // Trace numbering is strictly increasing and every blocked step has a reason.
    for window in result.trace.windows(2) {
        assert!(window[1].step == window[0].step + 1);
    }
    for step in result.trace.iter().filter(|s| s.block_reason.is_some()) {
        assert!(!step.block_reason.as_ref().unwrap().is_empty());
    }
    // Only the notify tool surfaced a side effect.
    assert_eq!(result.side_effects.len(), 1);
    assert!(result.side_effects[0].detail.contains("notify-slack"));
}

#[tokio::test]
async fn independent_runs_share_only_the_event_log() {
    let log = Arc::new(MemoryEventLog::new());
    let engine = Arc::new(SimulationEngine::new(Arc::clone(&log) as Arc<dyn EventLog>));

    let mut handles = Vec::new();
    for i in 0..4 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            let now = Utc::now();
            let bp = AgentBlueprint::new(
                format!("bp-{i}"),
                "Parallel Agent",
                "run concurrently",
                RiskTier::Low,
                now,
            )
            .with_tool(ToolDescriptor::new("t", "probe", RiskTier::Low, false));
            engine
                .simulate_agent(SimulationRequest {
                    blueprint: bp,
                    scenario: TestScenario::new("par", Principal::new("bot"), json!({})),
                    dry_run: true,
                })
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.success);
    }
    for i in 0..4 {
        let events = log.read(&format!("sim-bp-{i}")).await.unwrap();
        assert_eq!(events.first().unwrap().kind, event_kinds::SIMULATION_STARTED);
        assert_eq!(
            events.last().unwrap().kind,
            event_kinds::SIMULATION_COMPLETED
        );
    }
}

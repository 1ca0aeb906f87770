//! The simulation/execution engine.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use warden_state::{event_kinds, EventLog, GovEvent};

use crate::crv::{CrvGate, Validator};
use crate::dag::validate_topology;
use crate::domain::{AgentBlueprint, Commit, RiskTier, TestScenario, ToolDescriptor};
use crate::error::{KernelError, KernelResult};
use crate::policy::{ActionRequest, Decision, PolicyGuard};

use super::result::*;
use super::sandbox::SandboxAdapter;

/// Engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Dry runs block any tool whose risk tier is at or above this cutoff.
    /// Defaults to `High`, so both High and Critical tools are blocked;
    /// set to `Critical` for the laxer reading.
    pub dry_run_block_cutoff: RiskTier,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dry_run_block_cutoff: RiskTier::High,
        }
    }
}

/// One request to simulate (or execute) a blueprint under a scenario.
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    pub blueprint: AgentBlueprint,
    pub scenario: TestScenario,
    pub dry_run: bool,
}

/// Orchestrates per-tool governance: policy decisions, dry-run blocking,
/// sandbox execution, and CRV output gating, while appending an audit trail
/// to the external event log.
///
/// Without a sandbox adapter the engine runs in legacy-compatibility mode:
/// every tool is simulated regardless of `dry_run`, and nothing errors.
pub struct SimulationEngine {
    event_log: Arc<dyn EventLog>,
    sandbox: Option<Arc<dyn SandboxAdapter>>,
    guard: PolicyGuard,
    output_gate: CrvGate,
    config: EngineConfig,
}

impl SimulationEngine {
    /// Engine with no sandbox: simulate-only mode.
    pub fn new(event_log: Arc<dyn EventLog>) -> Self {
        Self {
            event_log,
            sandbox: None,
            guard: PolicyGuard::default(),
            output_gate: Self::default_output_gate(),
            config: EngineConfig::default(),
        }
    }

    /// Wire in a real executor for non-dry runs.
    pub fn with_sandbox(mut self, sandbox: Arc<dyn SandboxAdapter>) -> Self {
        self.sandbox = Some(sandbox);
        self
    }

    pub fn with_guard(mut self, guard: PolicyGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Replace the gate applied to tool outputs.
    pub fn with_output_gate(mut self, gate: CrvGate) -> Self {
        self.output_gate = gate;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn guard(&self) -> &PolicyGuard {
        &self.guard
    }

    /// Tool outputs must exist and be attributable.
    fn default_output_gate() -> CrvGate {
        CrvGate::new("Tool Output")
            .with_validator(Validator::non_empty_data("output-present"))
            .with_validator(Validator::actor_present("output-attributed"))
            .blocking()
    }

    /// Run a blueprint under a scenario.
    ///
    /// Strictly sequential: each trace step's number and status depend on
    /// what came before it. Blocked and denied units are recorded outcomes,
    /// not errors; only collaborator faults (ledger writes, sandbox
    /// execution, faulting validators) propagate as `Err`.
    #[instrument(skip(self, request), fields(blueprint = %request.blueprint.id, dry_run = request.dry_run))]
    pub async fn simulate_agent(&self, request: SimulationRequest) -> KernelResult<SimulationResult> {
        let started = Instant::now();
        let blueprint = &request.blueprint;
        let scenario = &request.scenario;
        let workflow_id = format!("sim-{}", blueprint.id);

        let mut run = RunAccumulator::default();

        // Blueprint-level policy decision, recorded before any tool runs.
        let creation = self.guard.evaluate(
            &ActionRequest::new("Blueprint Creation", blueprint.risk_profile),
            &scenario.principal,
            None,
            Utc::now(),
        );
        let creation_decision = creation.decision;
        run.policy_decisions.push(creation);
        run.push_trace("Blueprint Creation", StepStatus::Completed, None, None);

        // Blueprint-level CRV outcome: structural gate plus workflow
        // topology, folded into one check.
        let blueprint_outcome = self.validate_blueprint(blueprint)?;
        let blueprint_passed = blueprint_outcome.passed;
        run.crv_outcomes.push(blueprint_outcome);
        run.push_trace("Blueprint Validation", StepStatus::Completed, None, None);

        self.append(
            GovEvent::new(event_kinds::SIMULATION_STARTED, &workflow_id, Utc::now()).with_data(
                json!({
                    "blueprint_id": blueprint.id,
                    "scenario": scenario.name,
                    "dry_run": request.dry_run,
                    "tool_count": blueprint.tools.len(),
                }),
            ),
        )
        .await?;

        for tool in &blueprint.tools {
            self.process_tool(tool, &request, &workflow_id, &mut run).await?;
        }

        let success = creation_decision != Decision::Deny && blueprint_passed;
        let execution_time_ms = started.elapsed().as_millis() as u64;

        self.append(
            GovEvent::new(event_kinds::SIMULATION_COMPLETED, &workflow_id, Utc::now()).with_data(
                json!({
                    "blueprint_id": blueprint.id,
                    "success": success,
                    "execution_time_ms": execution_time_ms,
                    "tool_calls": run.tool_calls.len(),
                    "blocked_steps": run.blocked_steps.len(),
                    "side_effects": run.side_effects.len(),
                }),
            ),
        )
        .await?;

        debug!(
            %workflow_id,
            success,
            blocked = run.blocked_steps.len(),
            "simulation finished"
        );

        Ok(SimulationResult {
            success,
            execution_time_ms,
            trace: run.trace,
            tool_calls: run.tool_calls,
            policy_decisions: run.policy_decisions,
            crv_outcomes: run.crv_outcomes,
            blocked_steps: run.blocked_steps,
            side_effects: run.side_effects,
        })
    }

    /// Gate the blueprint itself: required structure plus the topology of
    /// every declared workflow.
    fn validate_blueprint(&self, blueprint: &AgentBlueprint) -> KernelResult<CrvOutcome> {
        let now = Utc::now();
        let gate = CrvGate::new("Blueprint Validation")
            .with_validator(Validator::required_fields(
                "blueprint-shape",
                &["id", "name", "goal", "tools"],
            ))
            .with_validator(Validator::actor_present("blueprint-attributed"));

        let commit = Commit::new(
            Uuid::new_v4().to_string(),
            format!("blueprint/{}", blueprint.id),
            serde_json::to_value(blueprint)?,
            &blueprint.name,
            "blueprint validation",
        );
        let gate_outcome = gate.validate(&commit)?;

        let mut topology_errors = Vec::new();
        for workflow in &blueprint.workflows {
            let report = validate_topology(workflow);
            for error in &report.errors {
                topology_errors.push(format!("workflow {}: {error}", workflow.id));
            }
        }

        let mut outcome = CrvOutcome::from_gate("Blueprint Validation", &gate_outcome, now);
        if !topology_errors.is_empty() {
            outcome.passed = false;
            let joined = topology_errors.join("; ");
            outcome.reason = Some(match outcome.reason.take() {
                Some(existing) => format!("{existing}; {joined}"),
                None => joined,
            });
        }
        Ok(outcome)
    }

    /// Govern one tool: dry-run cutoff, policy decision, then execute or
    /// simulate, gating real outputs through CRV.
    async fn process_tool(
        &self,
        tool: &ToolDescriptor,
        request: &SimulationRequest,
        workflow_id: &str,
        run: &mut RunAccumulator,
    ) -> KernelResult<()> {
        let scenario = &request.scenario;

        // Dry-run risk cutoff comes first: a blocked tool is neither
        // executed nor simulated, and the policy guard is never consulted.
        if request.dry_run && tool.risk_tier >= self.config.dry_run_block_cutoff {
            let reason = format!(
                "High-risk tool blocked in dry-run ({} tier at or above {} cutoff)",
                tool.risk_tier, self.config.dry_run_block_cutoff
            );
            run.block_tool(tool, &scenario.inputs, reason.clone());
            self.append(
                GovEvent::new(event_kinds::POLICY_DECISION, workflow_id, Utc::now())
                    .with_task(&tool.tool_id)
                    .with_data(json!({
                        "tool": tool.name,
                        "decision": "blocked",
                        "reason": reason,
                    })),
            )
            .await?;
            return Ok(());
        }

        let action = ActionRequest::new(&tool.name, tool.risk_tier);
        let decision = self.guard.evaluate(&action, &scenario.principal, None, Utc::now());
        let verdict = decision.decision;
        let decision_reason = decision.reason.clone();
        run.policy_decisions.push(decision);

        if verdict != Decision::Allow {
            let reason = decision_reason
                .unwrap_or_else(|| format!("policy decision: {verdict}"));
            warn!(tool = %tool.name, %verdict, "tool not allowed");
            run.block_tool(tool, &scenario.inputs, reason.clone());
            self.append(
                GovEvent::new(event_kinds::POLICY_DECISION, workflow_id, Utc::now())
                    .with_task(&tool.tool_id)
                    .with_data(json!({
                        "tool": tool.name,
                        "decision": verdict.to_string(),
                        "reason": reason,
                    })),
            )
            .await?;
            return Ok(());
        }

        let sandbox = if request.dry_run {
            None
        } else {
            self.sandbox.as_deref()
        };
        if let Some(sandbox) = sandbox {
            let outputs = sandbox.execute(tool, &scenario.inputs).await?;

            let commit = Commit::new(
                Uuid::new_v4().to_string(),
                tool.name.clone(),
                outputs.clone(),
                &scenario.principal.actor,
                format!("output of tool {}", tool.name),
            );
            let gate_outcome = self.output_gate.validate(&commit)?;
            let check_name = format!("Tool Output Validation: {}", tool.name);
            let crv = CrvOutcome::from_gate(check_name, &gate_outcome, Utc::now());
            let blocked = gate_outcome.blocked_commit;
            let gate_reason = gate_outcome.failure_reason().map(str::to_string);
            run.crv_outcomes.push(crv);

            if blocked {
                let reason = format!(
                    "CRV gate blocked output of {}: {}",
                    tool.name,
                    gate_reason.unwrap_or_else(|| "validation failed".into())
                );
                run.block_tool_with_outputs(tool, &scenario.inputs, Some(outputs), reason);
                // The tool really ran before the gate judged its output;
                // whatever it did to the outside world stays on the ledger.
                run.capture_side_effect(tool, "executed");
            } else {
                run.record_tool(tool, &scenario.inputs, Some(outputs), ToolCallStatus::Executed);
                run.push_trace(
                    format!("Execute {}", tool.name),
                    StepStatus::Executed,
                    Some(tool.name.clone()),
                    None,
                );
                run.capture_side_effect(tool, "executed");
            }
        } else {
            let outputs = json!({
                "simulated": true,
                "tool": tool.name,
                "inputs": scenario.inputs,
            });
            run.record_tool(tool, &scenario.inputs, Some(outputs), ToolCallStatus::Simulated);
            run.push_trace(
                format!("Simulate {}", tool.name),
                StepStatus::Simulated,
                Some(tool.name.clone()),
                None,
            );
            run.capture_side_effect(tool, "simulated");
        }

        self.append(
            GovEvent::new(event_kinds::POLICY_DECISION, workflow_id, Utc::now())
                .with_task(&tool.tool_id)
                .with_data(json!({
                    "tool": tool.name,
                    "decision": verdict.to_string(),
                })),
        )
        .await?;
        Ok(())
    }

    async fn append(&self, event: GovEvent) -> KernelResult<u64> {
        self.event_log.append(event).await.map_err(KernelError::from)
    }
}

/// Mutable collections of one in-flight run. Append-only; snapshotted into
/// the returned `SimulationResult`.
#[derive(Default)]
struct RunAccumulator {
    next_step: u32,
    trace: Vec<TraceStep>,
    tool_calls: Vec<ToolCallRecord>,
    policy_decisions: Vec<crate::policy::PolicyDecision>,
    crv_outcomes: Vec<CrvOutcome>,
    blocked_steps: Vec<BlockedStep>,
    side_effects: Vec<SideEffectRecord>,
}

impl RunAccumulator {
    fn push_trace(
        &mut self,
        action: impl Into<String>,
        status: StepStatus,
        tool: Option<String>,
        block_reason: Option<String>,
    ) {
        self.next_step += 1;
        self.trace.push(TraceStep {
            step: self.next_step,
            timestamp: Utc::now(),
            action: action.into(),
            status,
            tool,
            block_reason,
        });
    }

    fn record_tool(
        &mut self,
        tool: &ToolDescriptor,
        inputs: &Value,
        outputs: Option<Value>,
        status: ToolCallStatus,
    ) {
        self.tool_calls.push(ToolCallRecord {
            tool_name: tool.name.clone(),
            status,
            inputs: inputs.clone(),
            outputs,
            timestamp: Utc::now(),
        });
    }

    fn block_tool(&mut self, tool: &ToolDescriptor, inputs: &Value, reason: String) {
        self.block_tool_with_outputs(tool, inputs, None, reason);
    }

    fn block_tool_with_outputs(
        &mut self,
        tool: &ToolDescriptor,
        inputs: &Value,
        outputs: Option<Value>,
        reason: String,
    ) {
        self.record_tool(tool, inputs, outputs, ToolCallStatus::Blocked);
        self.push_trace(
            format!("Block {}", tool.name),
            StepStatus::Blocked,
            Some(tool.name.clone()),
            Some(reason.clone()),
        );
        self.blocked_steps.push(BlockedStep {
            tool: tool.name.clone(),
            reason,
        });
    }

    fn capture_side_effect(&mut self, tool: &ToolDescriptor, mode: &str) {
        if tool.has_side_effects {
            self.side_effects.push(SideEffectRecord {
                effect_type: "tool_side_effect".into(),
                captured: true,
                detail: format!("{} ({mode})", tool.name),
            });
        }
    }
}

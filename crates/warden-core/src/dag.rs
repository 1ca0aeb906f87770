//! Workflow topology validation.
//!
//! Evaluates a [`WorkflowSpec`]'s dependency relation and produces a
//! [`TopologyReport`] — the collect-everything verdict that blocks or allows
//! execution. Structural problems (dangling references, cycles) are report
//! entries, never errors: callers need the full list, not the first hit.
//!
//! Two advisory scans, [`validate_policy`] and [`validate_crv_rules`], emit
//! warnings for High/Critical tasks missing retry/compensation/permission
//! annotations. Advisories never affect validity.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::{TaskSpec, WorkflowSpec};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// A structural problem in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologyError {
    /// A dependency entry references a task id not present in the task set.
    MissingDependency {
        /// The referencing task (dependency-map key), or the missing id
        /// itself when the key is unknown.
        task_id: String,
        /// The id that does not exist.
        missing: String,
    },
    /// The dependency relation contains a cycle.
    Cycle {
        /// Task ids participating in the first cycle found.
        participants: Vec<String>,
    },
}

impl std::fmt::Display for TopologyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingDependency { task_id, missing } => {
                write!(f, "task {task_id} depends on unknown task {missing}")
            }
            Self::Cycle { participants } => {
                write!(f, "dependency cycle: {}", participants.join(" -> "))
            }
        }
    }
}

/// The outcome of validating a workflow's topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyReport {
    /// True iff `errors` is empty.
    pub valid: bool,
    pub errors: Vec<TopologyError>,
    /// Deterministic execution order; present only when valid.
    pub topological_order: Option<Vec<String>>,
}

/// A non-blocking warning from the policy/CRV completeness scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub task_id: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Topology validation
// ---------------------------------------------------------------------------

/// Validate the dependency graph of a workflow.
///
/// Pass 1 collects every missing-dependency reference (key or value).
/// Pass 2 runs only when pass 1 is clean — cycle detection over a graph
/// with dangling edges produces confusing cascades — and reports the first
/// cycle found via three-colour DFS. Clean graphs get a deterministic
/// Kahn order, ties broken by task declaration order, so re-validating an
/// unchanged spec yields an identical report.
pub fn validate_topology(spec: &WorkflowSpec) -> TopologyReport {
    let known: HashSet<&str> = spec.tasks.iter().map(|t| t.id.as_str()).collect();

    let mut errors = Vec::new();
    for (task_id, deps) in &spec.dependencies {
        if !known.contains(task_id.as_str()) {
            errors.push(TopologyError::MissingDependency {
                task_id: task_id.clone(),
                missing: task_id.clone(),
            });
        }
        for dep in deps {
            if !known.contains(dep.as_str()) {
                errors.push(TopologyError::MissingDependency {
                    task_id: task_id.clone(),
                    missing: dep.clone(),
                });
            }
        }
    }

    if !errors.is_empty() {
        return TopologyReport {
            valid: false,
            errors,
            topological_order: None,
        };
    }

    if let Some(cycle) = find_cycle(spec) {
        return TopologyReport {
            valid: false,
            errors: vec![TopologyError::Cycle {
                participants: cycle,
            }],
            topological_order: None,
        };
    }

    TopologyReport {
        valid: true,
        errors: Vec::new(),
        topological_order: Some(kahn_order(spec)),
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Colour {
    White,
    Grey,
    Black,
}

/// Three-colour DFS; returns the participants of the first cycle found.
///
/// Precondition: every id in `dependencies` exists in the task set.
fn find_cycle(spec: &WorkflowSpec) -> Option<Vec<String>> {
    let mut colour: HashMap<&str, Colour> = spec
        .tasks
        .iter()
        .map(|t| (t.id.as_str(), Colour::White))
        .collect();
    let empty: Vec<String> = Vec::new();

    // Iterative DFS with an explicit path stack so the cycle can be read
    // back out when a grey node is re-entered.
    for start in &spec.tasks {
        if colour[start.id.as_str()] != Colour::White {
            continue;
        }
        let mut stack: Vec<(&str, usize)> = vec![(start.id.as_str(), 0)];
        let mut path: Vec<&str> = Vec::new();

        while let Some((node, edge)) = stack.pop() {
            if edge == 0 {
                colour.insert(node, Colour::Grey);
                path.push(node);
            }
            let deps = spec
                .dependencies
                .get(node)
                .unwrap_or(&empty);
            if edge < deps.len() {
                stack.push((node, edge + 1));
                let next = deps[edge].as_str();
                match colour[next] {
                    Colour::White => stack.push((next, 0)),
                    Colour::Grey => {
                        // Cycle: everything on the path from `next` onward.
                        let from = path.iter().position(|n| *n == next).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            path[from..].iter().map(|s| s.to_string()).collect();
                        cycle.push(next.to_string());
                        return Some(cycle);
                    }
                    Colour::Black => {}
                }
            } else {
                colour.insert(node, Colour::Black);
                path.pop();
            }
        }
    }
    None
}

/// Deterministic Kahn ordering: repeatedly remove zero-in-degree tasks,
/// ties broken by declaration order.
///
/// Precondition: the graph is acyclic with no dangling references.
fn kahn_order(spec: &WorkflowSpec) -> Vec<String> {
    // in_degree[t] = number of tasks t depends on that are still pending.
    let mut in_degree: BTreeMap<&str, usize> = spec
        .tasks
        .iter()
        .map(|t| {
            let deps = spec.dependencies.get(&t.id).map_or(0, Vec::len);
            (t.id.as_str(), deps)
        })
        .collect();
    // dependents[d] = tasks that depend on d.
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for (task_id, deps) in &spec.dependencies {
        for dep in deps {
            dependents
                .entry(dep.as_str())
                .or_default()
                .push(task_id.as_str());
        }
    }

    let declaration: Vec<&str> = spec.tasks.iter().map(|t| t.id.as_str()).collect();
    let mut order = Vec::with_capacity(declaration.len());
    let mut placed: HashSet<&str> = HashSet::new();

    while order.len() < declaration.len() {
        // First ready task in declaration order. The precondition guarantees
        // one exists every round.
        let Some(next) = declaration
            .iter()
            .find(|id| !placed.contains(**id) && in_degree[**id] == 0)
            .copied()
        else {
            break;
        };
        placed.insert(next);
        order.push(next.to_string());
        if let Some(deps) = dependents.get(next) {
            for dependent in deps {
                if let Some(d) = in_degree.get_mut(dependent) {
                    *d -= 1;
                }
            }
        }
    }
    order
}

// ---------------------------------------------------------------------------
// Advisory scans
// ---------------------------------------------------------------------------

fn is_elevated(task: &TaskSpec) -> bool {
    task.risk_tier.requires_approval()
}

/// Warn when a High/Critical task lacks a retry policy or a compensation
/// annotation. Advisory only — consumed by the caller's own
/// policy-completeness checks, never blocking.
pub fn validate_policy(spec: &WorkflowSpec) -> Vec<Advisory> {
    let mut advisories = Vec::new();
    for task in spec.tasks.iter().filter(|t| is_elevated(t)) {
        if task.retry.is_none() {
            advisories.push(Advisory {
                task_id: task.id.clone(),
                message: format!(
                    "{} task {} has no retry policy",
                    task.risk_tier, task.id
                ),
            });
        }
        if task.compensation.is_none() {
            advisories.push(Advisory {
                task_id: task.id.clone(),
                message: format!(
                    "{} task {} has no compensation annotation",
                    task.risk_tier, task.id
                ),
            });
        }
    }
    advisories
}

/// Warn when a High/Critical task lacks a permission annotation, leaving
/// the policy guard nothing to check an approval against.
pub fn validate_crv_rules(spec: &WorkflowSpec) -> Vec<Advisory> {
    spec.tasks
        .iter()
        .filter(|t| is_elevated(t) && t.required_permissions.is_empty())
        .map(|t| Advisory {
            task_id: t.id.clone(),
            message: format!(
                "{} task {} declares no required permissions",
                t.risk_tier, t.id
            ),
        })
        .collect()
}

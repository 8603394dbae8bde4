//! Structural checks run once, when a plan document becomes a plan.

use std::collections::{HashMap, HashSet};

use crate::{error::PlanError, params::StepSpec};

/// Index-based view of a document that passed the id and reference checks.
#[derive(Debug)]
pub(crate) struct Graph {
    /// Step id → declaration position
    pub index: HashMap<String, usize>,
    /// Per step, positions of its dependencies (deduplicated, first
    /// occurrence kept)
    pub deps: Vec<Vec<usize>>,
    /// Position of the final step
    pub final_step: usize,
}

/// Checks ids, the final step and dependency references, then rejects
/// cycles.
///
/// Errors are reported in that order, so a document with both a duplicate
/// id and a cycle reports the duplicate.
pub(crate) fn validate(steps: &[StepSpec], final_step_id: &str) -> Result<Graph, PlanError> {
    if steps.is_empty() {
        return Err(PlanError::EmptyPlan);
    }

    let mut index = HashMap::with_capacity(steps.len());
    // Step ids name relations in SQL, which match ASCII letters in any case.
    let mut relation_names = HashSet::with_capacity(steps.len());
    for (position, step) in steps.iter().enumerate() {
        if step.id.trim().is_empty() {
            return Err(PlanError::InvalidStepId { position });
        }
        if step.query.trim().is_empty() {
            return Err(PlanError::EmptyQuery {
                id: step.id.clone(),
            });
        }
        if !relation_names.insert(step.id.to_ascii_lowercase())
            || index.insert(step.id.clone(), position).is_some()
        {
            return Err(PlanError::DuplicateStepId {
                id: step.id.clone(),
            });
        }
    }

    let final_step = *index
        .get(final_step_id)
        .ok_or_else(|| PlanError::UnknownFinalStep {
            id: final_step_id.to_string(),
        })?;

    let mut deps = Vec::with_capacity(steps.len());
    for step in steps {
        let mut resolved: Vec<usize> = Vec::with_capacity(step.depends_on.len());
        let mut seen = HashSet::with_capacity(step.depends_on.len());
        for dependency in &step.depends_on {
            let position = *index
                .get(dependency)
                .ok_or_else(|| PlanError::UnknownDependency {
                    step: step.id.clone(),
                    dependency: dependency.clone(),
                })?;
            if seen.insert(position) {
                resolved.push(position);
            }
        }
        deps.push(resolved);
    }

    if let Some(cycle) = find_cycle(&deps) {
        return Err(PlanError::CyclicDependency {
            cycle: cycle.into_iter().map(|i| steps[i].id.clone()).collect(),
        });
    }

    Ok(Graph {
        index,
        deps,
        final_step,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Depth-first search from every unvisited step, in O(steps + edges).
///
/// Returns the first cycle found as positions along the dependency edges,
/// closed by repeating its first element. Iterative so deep chains cannot
/// exhaust the call stack.
pub(crate) fn find_cycle(deps: &[Vec<usize>]) -> Option<Vec<usize>> {
    let mut marks = vec![Mark::Unvisited; deps.len()];
    // (node, index of the next edge to follow)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..deps.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        marks[root] = Mark::OnStack;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let Some(&next) = deps[node].get(frame.1) else {
                marks[node] = Mark::Done;
                stack.pop();
                continue;
            };
            frame.1 += 1;

            match marks[next] {
                Mark::Unvisited => {
                    marks[next] = Mark::OnStack;
                    stack.push((next, 0));
                }
                Mark::OnStack => {
                    let start = stack.iter().position(|&(n, _)| n == next).unwrap_or(0);
                    let mut cycle: Vec<usize> = stack[start..].iter().map(|&(n, _)| n).collect();
                    cycle.push(next);
                    return Some(cycle);
                }
                Mark::Done => {}
            }
        }
    }

    None
}

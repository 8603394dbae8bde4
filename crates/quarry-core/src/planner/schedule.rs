//! Execution ordering.

use std::collections::VecDeque;

use log::error;

use crate::error::PlanError;

/// Kahn's algorithm over index-based dependencies.
///
/// The ready queue is FIFO and seeded in declaration order, so the result
/// is fully determined by the input. An order shorter than the plan means
/// the graph was not acyclic after all; that is reported as
/// [`PlanError::Internal`] instead of returning a partial order.
pub(crate) fn topological_order(deps: &[Vec<usize>]) -> Result<Vec<usize>, PlanError> {
    let total = deps.len();
    let mut in_degree: Vec<usize> = deps.iter().map(Vec::len).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); total];
    for (step, step_deps) in deps.iter().enumerate() {
        for &dependency in step_deps {
            dependents[dependency].push(step);
        }
    }

    let mut ready: VecDeque<usize> = (0..total).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(total);

    while let Some(step) = ready.pop_front() {
        order.push(step);
        for &dependent in &dependents[step] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.push_back(dependent);
            }
        }
    }

    if order.len() != total {
        error!(
            "Scheduler ordered {} of {} steps; dependency graph is not acyclic",
            order.len(),
            total
        );
        return Err(PlanError::Internal {
            ordered: order.len(),
            total,
        });
    }

    Ok(order)
}

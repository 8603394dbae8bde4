//! Plan model definition and read accessors.

use std::{collections::HashMap, time::Duration};

use super::{ResultSet, Step, StepStatus};
use crate::{
    error::{PlanError, Result},
    params::PlanSpec,
    planner::PlanBuilder,
};

/// A validated DAG of query steps with one designated final step.
///
/// A `Plan` can only be obtained through [`PlanBuilder`] (or the
/// `from_*` shortcuts that delegate to it), so every instance satisfies the
/// structural invariants: unique ids, a known final step, resolvable and
/// acyclic dependencies. The shape never changes afterwards; only step
/// execution state is updated while the plan runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    steps: Vec<Step>,
    index: HashMap<String, usize>,
    final_step: usize,
    question: Option<String>,
    order: Vec<usize>,
    total_duration: Option<Duration>,
}

impl Plan {
    pub(crate) fn from_parts(
        steps: Vec<Step>,
        index: HashMap<String, usize>,
        final_step: usize,
        question: Option<String>,
        order: Vec<usize>,
    ) -> Self {
        Self {
            steps,
            index,
            final_step,
            question,
            order,
            total_duration: None,
        }
    }

    /// Validates a plan document and promotes it to a plan.
    pub fn from_spec(spec: PlanSpec) -> std::result::Result<Self, PlanError> {
        PlanBuilder::from(spec).build()
    }

    /// Parses and validates a JSON plan document.
    pub fn from_json(json: &str) -> Result<Self> {
        let spec = PlanSpec::from_json(json)?;
        Ok(Self::from_spec(spec)?)
    }

    /// A plan made of a single query (step `q1`) with no dependencies.
    pub fn single(
        query: impl Into<String>,
        question: Option<String>,
    ) -> std::result::Result<Self, PlanError> {
        Self::from_spec(PlanSpec::single(query, question))
    }

    /// Steps in declaration order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, id: &str) -> Option<&Step> {
        self.index.get(id).map(|&i| &self.steps[i])
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn final_step_id(&self) -> &str {
        self.steps[self.final_step].id()
    }

    pub fn final_step(&self) -> &Step {
        &self.steps[self.final_step]
    }

    /// The natural-language request the plan answers, if recorded.
    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    /// Wall time of the last execution, set once `execute` returns.
    pub fn total_duration(&self) -> Option<Duration> {
        self.total_duration
    }

    /// Steps in the order they run: every step after all of its
    /// dependencies.
    pub fn execution_order(&self) -> Vec<&Step> {
        self.order.iter().map(|&i| &self.steps[i]).collect()
    }

    /// Step ids in execution order.
    pub fn execution_order_ids(&self) -> Vec<&str> {
        self.order.iter().map(|&i| self.steps[i].id()).collect()
    }

    /// `true` when every step has completed.
    pub fn is_complete(&self) -> bool {
        self.steps
            .iter()
            .all(|step| step.status() == StepStatus::Completed)
    }

    /// `true` when at least one step failed.
    pub fn has_errors(&self) -> bool {
        self.steps
            .iter()
            .any(|step| step.status() == StepStatus::Failed)
    }

    /// Result of the final step, only once it has completed.
    pub fn final_results(&self) -> Option<&ResultSet> {
        let step = self.final_step();
        match step.status() {
            StepStatus::Completed => step.result(),
            _ => None,
        }
    }

    pub(crate) fn order_indices(&self) -> &[usize] {
        &self.order
    }

    pub(crate) fn final_step_index(&self) -> usize {
        self.final_step
    }

    pub(crate) fn step_at(&self, index: usize) -> &Step {
        &self.steps[index]
    }

    pub(crate) fn step_at_mut(&mut self, index: usize) -> &mut Step {
        &mut self.steps[index]
    }

    pub(crate) fn set_total_duration(&mut self, duration: Duration) {
        self.total_duration = Some(duration);
    }
}

//! Builder separating unvalidated plan documents from validated plans.

use std::collections::HashSet;

use log::debug;

use super::{schedule, validate};
use crate::{
    error::PlanError,
    models::{Plan, Step},
    params::{PlanSpec, StepSpec},
};

/// Builder for creating validated [`Plan`] instances.
///
/// # Examples
///
/// ```rust
/// use quarry_core::{params::StepSpec, PlanBuilder};
///
/// let plan = PlanBuilder::new()
///     .step(StepSpec::new("q1", "SELECT 1 AS total"))
///     .step(StepSpec::new("q2", "SELECT total * 2 FROM q1").depends_on(["q1"]))
///     .final_step("q2")
///     .build()
///     .expect("valid plan");
///
/// assert_eq!(plan.execution_order_ids(), vec!["q1", "q2"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PlanBuilder {
    steps: Vec<StepSpec>,
    final_step_id: Option<String>,
    question: Option<String>,
}

impl PlanBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step.
    pub fn step(mut self, step: StepSpec) -> Self {
        self.steps.push(step);
        self
    }

    /// Appends several steps, keeping their order.
    pub fn steps<I: IntoIterator<Item = StepSpec>>(mut self, steps: I) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Sets the step whose result is the plan's output.
    ///
    /// If never called, the last declared step is used.
    pub fn final_step(mut self, id: impl Into<String>) -> Self {
        self.final_step_id = Some(id.into());
        self
    }

    /// Records the natural-language request the plan answers.
    pub fn question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    /// Validates the accumulated steps and builds the plan.
    ///
    /// # Errors
    ///
    /// Returns the first structural problem found: an empty plan, an empty
    /// or duplicate step id, an unknown final step, an unknown dependency,
    /// or a dependency cycle.
    pub fn build(self) -> Result<Plan, PlanError> {
        let final_step_id = match self.final_step_id {
            Some(id) => id,
            None => self
                .steps
                .last()
                .map(|step| step.id.clone())
                .ok_or(PlanError::EmptyPlan)?,
        };

        let graph = validate::validate(&self.steps, &final_step_id)?;
        let order = schedule::topological_order(&graph.deps)?;

        let steps: Vec<Step> = self
            .steps
            .into_iter()
            .map(|spec| {
                // Same first-occurrence deduplication as the validator.
                let mut seen = HashSet::with_capacity(spec.depends_on.len());
                let mut depends_on = spec.depends_on;
                depends_on.retain(|dependency| seen.insert(dependency.clone()));
                Step::new(spec.id, spec.description, spec.query, depends_on)
            })
            .collect();

        debug!(
            "Validated plan with {} steps, final step '{}'",
            steps.len(),
            final_step_id
        );

        Ok(Plan::from_parts(
            steps,
            graph.index,
            graph.final_step,
            self.question,
            order,
        ))
    }
}

impl From<PlanSpec> for PlanBuilder {
    fn from(spec: PlanSpec) -> Self {
        Self {
            steps: spec.steps,
            final_step_id: Some(spec.final_step_id),
            question: spec.question,
        }
    }
}

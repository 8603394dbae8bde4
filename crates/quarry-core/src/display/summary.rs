//! Outcome overview of an executed plan.

use std::fmt;

use super::table::ResultTable;
use crate::{
    models::{Plan, StepStatus},
    report::millis,
};

/// Wrapper summarising an executed plan: one line per step in execution
/// order, the overall status and a preview of the final result.
///
/// When a step failed, the steps that did complete are listed as partial
/// results; their rows remain available through the plan.
pub struct ExecutionSummary<'a> {
    plan: &'a Plan,
    preview_rows: usize,
}

impl<'a> ExecutionSummary<'a> {
    pub const DEFAULT_PREVIEW_ROWS: usize = 20;

    pub fn new(plan: &'a Plan) -> Self {
        Self {
            plan,
            preview_rows: Self::DEFAULT_PREVIEW_ROWS,
        }
    }

    /// Sets how many rows of the final result are shown.
    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }
}

impl fmt::Display for ExecutionSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plan = self.plan;
        let status = if plan.is_complete() {
            "✓ Completed"
        } else if plan.has_errors() {
            "✗ Failed"
        } else {
            "○ Not finished"
        };

        writeln!(f, "## Execution: {status}")?;
        writeln!(f)?;
        if let Some(question) = plan.question() {
            writeln!(f, "> {question}")?;
            writeln!(f)?;
        }

        for step in plan.execution_order() {
            write!(f, "- **{}** {}", step.id(), step.status().with_icon())?;
            if let Some(rows) = step.row_count() {
                write!(f, ", {rows} rows")?;
            }
            if let Some(duration) = step.duration() {
                write!(f, ", {:.1}ms", millis(duration))?;
            }
            if !step.corrections().is_empty() {
                write!(f, ", {} corrections", step.corrections().len())?;
            }
            if let Some(error) = step.error() {
                write!(f, ": {error}")?;
            }
            writeln!(f)?;
        }
        if let Some(total) = plan.total_duration() {
            writeln!(f)?;
            writeln!(f, "Total: {:.1}ms", millis(total))?;
        }

        if let Some(result) = plan.final_results() {
            writeln!(f)?;
            writeln!(f, "### Result of {}", plan.final_step_id())?;
            writeln!(f)?;
            write!(f, "{}", ResultTable::new(result).limit(self.preview_rows))?;
            if plan.final_step().is_truncated() {
                writeln!(f)?;
                writeln!(f, "_Result truncated to {} rows._", result.row_count())?;
            }
        } else if plan.has_errors() {
            let completed: Vec<&str> = plan
                .execution_order()
                .into_iter()
                .filter(|step| step.status() == StepStatus::Completed)
                .map(|step| step.id())
                .collect();
            writeln!(f)?;
            if completed.is_empty() {
                writeln!(f, "No step completed.")?;
            } else {
                writeln!(f, "Partial results are available for: {}", completed.join(", "))?;
            }
        }

        Ok(())
    }
}

//! Display implementations for domain models.
//!
//! Kept apart from the model definitions so the models stay plain data.

use std::fmt;

use jiff::{tz::TimeZone, Timestamp};

use super::table::ResultTable;
use crate::{
    models::{Plan, Step, StepStatus},
    report::millis,
};

/// Rows of an intermediate result shown under a step.
const STEP_PREVIEW_ROWS: usize = 10;

/// Formats a timestamp in the system time zone as
/// `YYYY-MM-DD HH:MM:SS TZ`.
pub struct LocalDateTime<'a>(pub &'a Timestamp);

impl fmt::Display for LocalDateTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let zoned = self.0.to_zoned(TimeZone::system());
        write!(f, "{}", zoned.strftime("%Y-%m-%d %H:%M:%S %Z"))
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "### {} ({})", self.id(), self.status().with_icon())?;
        writeln!(f)?;

        if !self.description().is_empty() {
            writeln!(f, "{}", self.description())?;
            writeln!(f)?;
        }

        writeln!(f, "```sql")?;
        writeln!(f, "{}", self.query())?;
        writeln!(f, "```")?;
        writeln!(f)?;

        if !self.depends_on().is_empty() {
            writeln!(f, "- Depends on: {}", self.depends_on().join(", "))?;
        }
        if self.attempts() > 1 {
            writeln!(f, "- Attempts: {}", self.attempts())?;
        }
        if let Some(rows) = self.row_count() {
            let note = if self.is_truncated() { " (truncated)" } else { "" };
            writeln!(f, "- Rows: {rows}{note}")?;
        }
        if let Some(duration) = self.duration() {
            writeln!(f, "- Duration: {:.1}ms", millis(duration))?;
        }
        if let Some(started) = self.started_at() {
            writeln!(f, "- Started: {}", LocalDateTime(&started))?;
        }

        if !self.corrections().is_empty() {
            writeln!(f)?;
            writeln!(f, "#### Corrections")?;
            writeln!(f)?;
            for correction in self.corrections() {
                writeln!(f, "{}. `{}`", correction.attempt, correction.error)?;
            }
        }

        if let Some(error) = self.error() {
            writeln!(f)?;
            writeln!(f, "#### Error")?;
            writeln!(f)?;
            writeln!(f, "{error}")?;
        }

        if let Some(result) = self.result() {
            writeln!(f)?;
            writeln!(f, "#### Result")?;
            writeln!(f)?;
            write!(f, "{}", ResultTable::new(result).limit(STEP_PREVIEW_ROWS))?;
        }

        writeln!(f)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Query plan")?;
        writeln!(f)?;

        if let Some(question) = self.question() {
            writeln!(f, "> {question}")?;
            writeln!(f)?;
        }

        writeln!(f, "- Steps: {}", self.len())?;
        writeln!(f, "- Final step: {}", self.final_step_id())?;
        writeln!(f, "- Order: {}", self.execution_order_ids().join(" → "))?;
        if let Some(total) = self.total_duration() {
            writeln!(f, "- Total duration: {:.1}ms", millis(total))?;
        }

        writeln!(f, "\n## Steps")?;
        writeln!(f)?;
        for step in self.execution_order() {
            write!(f, "{step}")?;
        }

        Ok(())
    }
}

//! Step model definition and its state transitions.

use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{ResultSet, StepStatus};

/// One correction applied to a step after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    /// Correction number within the step, starting at 1
    pub attempt: u32,
    /// Step query text that failed
    pub failed_query: String,
    /// Verbatim error reported by the store
    pub error: String,
    /// Query text proposed by the corrector
    pub revised_query: String,
}

/// Represents an individual query step within a plan.
///
/// Execution state is only changed through the crate-internal transitions
/// below, which keep `result` present exactly when the step is
/// [`StepStatus::Completed`] and `error` present exactly when it is
/// [`StepStatus::Failed`].
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    id: String,
    description: String,
    query: String,
    depends_on: Vec<String>,
    status: StepStatus,
    result: Option<ResultSet>,
    error: Option<String>,
    row_count: Option<usize>,
    duration: Option<Duration>,
    started_at: Option<Timestamp>,
    attempts: u32,
    corrections: Vec<Correction>,
    truncated: bool,
}

impl Step {
    pub(crate) fn new(
        id: String,
        description: String,
        query: String,
        depends_on: Vec<String>,
    ) -> Self {
        Self {
            id,
            description,
            query,
            depends_on,
            status: StepStatus::Pending,
            result: None,
            error: None,
            row_count: None,
            duration: None,
            started_at: None,
            attempts: 0,
            corrections: Vec::new(),
            truncated: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The step's own query text, as last attempted.
    ///
    /// Dependencies are referenced by step id here; the inlined relations
    /// are added at execution time and never stored.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    pub fn status(&self) -> StepStatus {
        self.status
    }

    /// Result rows, present only once the step has completed.
    pub fn result(&self) -> Option<&ResultSet> {
        self.result.as_ref()
    }

    /// Error message, present only once the step has failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn row_count(&self) -> Option<usize> {
        self.row_count
    }

    /// Execution time of the last attempt.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Wall-clock time the step started executing.
    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    /// Number of times the query was submitted to the store.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn corrections(&self) -> &[Correction] {
        &self.corrections
    }

    /// Whether result rows were dropped by the final-step row cap.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub(crate) fn begin(&mut self) {
        debug_assert_eq!(self.status, StepStatus::Pending, "step {} restarted", self.id);
        self.status = StepStatus::Executing;
        self.started_at = Some(Timestamp::now());
    }

    pub(crate) fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    pub(crate) fn apply_correction(&mut self, correction: Correction) {
        self.query = correction.revised_query.clone();
        self.corrections.push(correction);
    }

    pub(crate) fn complete(&mut self, result: ResultSet, duration: Duration, truncated: bool) {
        self.row_count = Some(result.row_count());
        self.result = Some(result);
        self.error = None;
        self.duration = Some(duration);
        self.truncated = truncated;
        self.status = StepStatus::Completed;
    }

    pub(crate) fn fail(&mut self, error: String, duration: Option<Duration>) {
        self.result = None;
        self.row_count = None;
        self.error = Some(error);
        self.duration = duration;
        self.status = StepStatus::Failed;
    }
}

//! Serializable execution reports.
//!
//! A [`PlanSnapshot`] is a plain copy of a plan's state: every step with
//! its last attempted query, status, timings, error, corrections and
//! intermediate result, plus the overall completion flags. Snapshots are a
//! pure function of the plan, so taking one twice without re-running yields
//! identical values.

use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    models::{Correction, Plan, ResultSet, Step, StepStatus},
};

/// Milliseconds as a float, the unit reports use for durations.
pub(crate) fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Serializable state of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSnapshot {
    pub id: String,
    pub description: String,
    /// Query text as last attempted
    pub query: String,
    pub depends_on: Vec<String>,
    pub status: StepStatus,
    pub attempts: u32,
    pub row_count: Option<usize>,
    pub duration_ms: Option<f64>,
    pub started_at: Option<Timestamp>,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corrections: Vec<Correction>,
    #[serde(default)]
    pub truncated: bool,
    pub result: Option<ResultSet>,
}

impl From<&Step> for StepSnapshot {
    fn from(step: &Step) -> Self {
        Self {
            id: step.id().to_string(),
            description: step.description().to_string(),
            query: step.query().to_string(),
            depends_on: step.depends_on().to_vec(),
            status: step.status(),
            attempts: step.attempts(),
            row_count: step.row_count(),
            duration_ms: step.duration().map(millis),
            started_at: step.started_at(),
            error: step.error().map(String::from),
            corrections: step.corrections().to_vec(),
            truncated: step.is_truncated(),
            result: step.result().cloned(),
        }
    }
}

/// Serializable state of a whole plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSnapshot {
    pub steps: Vec<StepSnapshot>,
    pub final_step_id: String,
    pub question: Option<String>,
    pub execution_order: Vec<String>,
    pub total_duration_ms: Option<f64>,
    pub is_complete: bool,
    pub has_errors: bool,
}

impl PlanSnapshot {
    /// The final step's snapshot.
    pub fn final_step(&self) -> Option<&StepSnapshot> {
        self.steps.iter().find(|step| step.id == self.final_step_id)
    }
}

impl From<&Plan> for PlanSnapshot {
    fn from(plan: &Plan) -> Self {
        Self {
            steps: plan.steps().iter().map(StepSnapshot::from).collect(),
            final_step_id: plan.final_step_id().to_string(),
            question: plan.question().map(String::from),
            execution_order: plan
                .execution_order_ids()
                .into_iter()
                .map(String::from)
                .collect(),
            total_duration_ms: plan.total_duration().map(millis),
            is_complete: plan.is_complete(),
            has_errors: plan.has_errors(),
        }
    }
}

impl Plan {
    /// Captures the plan's current state.
    pub fn snapshot(&self) -> PlanSnapshot {
        PlanSnapshot::from(self)
    }

    /// The snapshot as a JSON value tree.
    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.snapshot())?)
    }

    /// The snapshot as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }
}

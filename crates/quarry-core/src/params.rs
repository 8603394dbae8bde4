//! Unvalidated plan documents.
//!
//! Plans usually arrive as loosely-typed JSON from an external plan
//! generator. The structures here accept that input as plain data and carry
//! no guarantees at all; the only way to turn them into a
//! [`Plan`](crate::models::Plan) is through
//! [`PlanBuilder`](crate::planner::PlanBuilder), which validates them.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  JSON document  │    │    PlanSpec     │    │      Plan       │
//! │ (plan generator)│───▶│  (serde, DTO)   │───▶│   (validated)   │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! Field aliases (`queries`, `sql`, `final_query_id`) accept the naming the
//! upstream generator uses.
//!
//! With the `schema` feature enabled the documents also derive
//! `schemars::JsonSchema`, so the expected input format can be published to
//! whatever produces plans.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One step of a plan document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct StepSpec {
    /// Step id, unique within the plan; dependent queries use it as a
    /// relation name
    pub id: String,

    /// Human-readable purpose of the step
    #[serde(default)]
    pub description: String,

    /// SQL query text
    #[serde(alias = "sql")]
    pub query: String,

    /// Ids of the steps whose results this query reads
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl StepSpec {
    /// A step with no description and no dependencies.
    pub fn new(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            query: query.into(),
            depends_on: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn depends_on<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(ids.into_iter().map(Into::into));
        self
    }
}

/// A whole plan document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct PlanSpec {
    /// Steps in declaration order
    #[serde(alias = "queries")]
    pub steps: Vec<StepSpec>,

    /// Id of the step whose result answers the question
    #[serde(alias = "final_query_id")]
    pub final_step_id: String,

    /// Original natural-language request, kept for traceability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

impl PlanSpec {
    /// Parses a plan document from JSON without validating it.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// A one-step document for callers that only have a single query.
    pub fn single(query: impl Into<String>, question: Option<String>) -> Self {
        Self {
            steps: vec![StepSpec::new("q1", query).describe("Execute query")],
            final_step_id: "q1".to_string(),
            question,
        }
    }
}

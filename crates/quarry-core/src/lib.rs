//! Core library for the quarry multi-step query engine.
//!
//! A question that needs several queries is expressed as a [`Plan`]: a DAG
//! of SQL [`Step`]s where later steps read the results of earlier ones by
//! step id. The crate validates plans, orders them, runs each step against
//! a relational store with its dependencies' results inlined, and repairs
//! failing queries through a pluggable [`Corrector`] within a bounded
//! budget.
//!
//! # Architecture
//!
//! - [`params`]: unvalidated plan documents as they arrive from a plan
//!   generator
//! - [`planner`]: [`PlanBuilder`], the validator and the scheduler
//! - [`models`]: the validated [`Plan`], [`Step`] and the [`ResultSet`]
//!   relation passed between steps
//! - [`engine`]: the [`Engine`], the dependency resolver and the
//!   retry/correction controller
//! - [`db`]: [`SqliteExecutor`], the SQLite implementation of [`Executor`]
//! - [`report`]: serializable snapshots of an executed plan
//! - [`display`]: markdown formatting for terminals
//!
//! # Quick Start
//!
//! ```rust
//! use quarry_core::{db::SqliteExecutor, EngineBuilder, Plan, Value};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let plan = Plan::from_json(
//!     r#"{
//!         "steps": [
//!             {"id": "q1", "query": "SELECT 1500 AS total UNION ALL SELECT 1750"},
//!             {"id": "q2", "query": "SELECT MAX(total) AS best FROM q1", "depends_on": ["q1"]}
//!         ],
//!         "final_step_id": "q2"
//!     }"#,
//! )?;
//!
//! let engine = EngineBuilder::new(SqliteExecutor::open_in_memory()?).build()?;
//! let plan = engine.execute_owned(plan);
//!
//! assert!(plan.is_complete());
//! let best = plan.final_results().unwrap();
//! assert_eq!(best.rows()[0][0], Value::Integer(1750));
//! # Ok(())
//! # }
//! ```

pub mod db;
pub mod display;
pub mod engine;
pub mod error;
pub mod models;
pub mod params;
pub mod planner;
pub mod report;

// Re-export commonly used types
pub use db::SqliteExecutor;
pub use engine::{
    CorrectionRequest, Corrector, Engine, EngineBuilder, EngineConfig, ErrorClass, Executor,
    NoCorrector, RetryPolicy, StoreError, StoreErrorCode,
};
pub use error::{Error, PlanError, Result};
pub use models::{Correction, Plan, ResultSet, Step, StepStatus, Value};
pub use params::{PlanSpec, StepSpec};
pub use planner::PlanBuilder;
pub use report::{PlanSnapshot, StepSnapshot};

//! Markdown display for plans, steps and results.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! wrapper types add context-specific views on top of them.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Domain Models  │    │ Display Wrappers│    │    Markdown     │
//! │ (Plan, Step,    │───▶│ (ResultTable,   │───▶│     Output      │
//! │  ResultSet)     │    │ ExecutionSummary│    │   (Terminal)    │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! - [`models`]: `Display` for [`Plan`](crate::Plan), [`Step`](crate::Step)
//!   and [`StepStatus`](crate::StepStatus), plus [`LocalDateTime`]
//! - [`table`]: [`ResultTable`], a markdown table with a row preview limit
//! - [`summary`]: [`ExecutionSummary`], the per-step outcome overview
//!
//! ```rust
//! use quarry_core::{display::ResultTable, ResultSet, Value};
//!
//! let result = ResultSet::new(
//!     vec!["month".into(), "total".into()],
//!     vec![vec![Value::from("Nov"), Value::Real(1500.0)]],
//! )
//! .unwrap();
//!
//! let output = ResultTable::new(&result).to_string();
//! assert!(output.starts_with("| month | total |"));
//! ```

pub mod models;
pub mod summary;
pub mod table;

pub use models::LocalDateTime;
pub use summary::ExecutionSummary;
pub use table::ResultTable;

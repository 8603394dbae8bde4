//! Plan construction: validation and scheduling.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  PlanBuilder    │    │   validate      │    │   schedule      │
//! │ (StepSpec bag)  │───▶│ (ids, refs,     │───▶│ (Kahn's order)  │───▶ Plan
//! │                 │    │  cycles)        │    │                 │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ## Submodules
//!
//! - [`builder`]: the only way to obtain a [`Plan`](crate::models::Plan)
//! - `validate`: unique ids, known final step, resolvable dependencies,
//!   acyclicity, all in time linear in steps plus edges
//! - `schedule`: deterministic topological order, computed once and cached
//!   on the plan

pub mod builder;
mod schedule;
mod validate;


pub use builder::PlanBuilder;

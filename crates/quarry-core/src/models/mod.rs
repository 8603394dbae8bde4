//! Data models for query plans and their steps.
//!
//! [`Plan`] and [`Step`] are the validated domain objects. Their shape is
//! fixed at construction; execution state is updated in place by the
//! [`engine`](crate::engine) and exposed read-only. [`ResultSet`] and
//! [`Value`] are the typed relation that flows between dependent steps.
//!
//! Display implementations live in [`crate::display::models`] and
//! serializable snapshots in [`crate::report`].

pub mod plan;
pub mod result_set;
pub mod status;
pub mod step;
pub mod value;


pub use plan::Plan;
pub use result_set::{ResultSet, ShapeError};
pub use status::StepStatus;
pub use step::{Correction, Step};
pub use value::Value;

//! Promotion subsystem
//!
//! - `paths`: promotion instruction set, coalesced per (source, target)
//! - `planner`: which paths of a tracking report move where
//! - `executor`: promotion by path with read-only flips and rollback

mod errors;
pub mod executor;
mod paths;
pub mod planner;

pub use errors::{PromotionError, PromotionResult};
pub use executor::{validation_error, PromotionExecutor, ReadOnlyFlags};
pub use paths::PromotionPaths;
pub use planner::PromotionPlanner;

//! Plan orchestration: builds plans, applies what-if overrides and merges
//! filtration, bioload, compatibility and recommendations into one state.

pub mod builder;
pub mod engine;
pub mod state;

pub use builder::{apply_overrides, PlanBuilder};
pub use engine::StockingEngine;
pub use state::{Chip, ComputedState, Status};

pub mod analysis;
pub mod bioload;
pub mod catalog;
pub mod compat;
pub mod config;
pub mod constants;
pub mod error;
pub mod filtration;
pub mod logger;
pub mod planner;
pub mod recommend;
pub mod sanitize;
pub mod severity;

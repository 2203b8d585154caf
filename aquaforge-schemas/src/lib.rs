pub mod file_formats;
pub mod filter;
pub mod plan;
pub mod species;
pub mod stock;
pub mod tank;
pub mod water;

pub mod breakeven;
pub mod comparison;
pub mod config;
pub mod error;
pub mod hsa;
pub mod monte_carlo;
pub mod plan;
pub mod types;
pub mod utilization;

pub use error::{CoverageError, Result};

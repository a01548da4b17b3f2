//! Domain logic
//!
//! - `charts` - dashboard chart data pipeline
//! - `samples` - built-in sample data sets

pub mod charts;
pub mod samples;

pub use charts::{DashboardDataService, SeriesKey};
pub use samples::{SeedReport, seed_samples};

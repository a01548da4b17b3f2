//! Pulseboard server
//!
//! Multi-tenant analytics dashboards: organizations push JSON records into
//! named data sources and read back renderer-ready chart series.

pub mod api;
pub mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;

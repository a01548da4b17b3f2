//! API route handlers

pub mod api_keys;
pub mod dashboards;
pub mod data;
pub mod health;

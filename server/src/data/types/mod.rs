//! Shared data types
//!
//! Row types for the transactional store, chart definitions, record payloads
//! and backend-neutral pipeline stages.

mod charts;
mod pipeline;
mod records;
mod transactional;

pub use charts::{AggregateKind, ChartConfig, ChartSpec, ChartType};
pub use pipeline::{Accumulator, ResultRow, Stage};
pub use records::{FieldValue, RecordData, StoredRecord, merge_columns};
pub use transactional::{
    ApiKeyRow, ApiKeyValidation, ChartRemoval, DashboardRow, DataSourceRow, OrganizationRow,
    SourceType,
};

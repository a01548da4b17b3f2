//! Dashboard chart data pipeline
//!
//! - `pipeline` - chart definition to stage list
//! - `executor` - runs stages against a record store
//! - `transform` - executor rows to `{labels, values}`
//! - `colors` - deterministic palette
//! - `dashboard` - per-dashboard orchestration with fail-soft charts

mod colors;
mod dashboard;
mod executor;
mod pipeline;
mod transform;

pub use colors::{ChartColors, chart_colors};
pub use dashboard::{
    ChartData, ChartPayload, DashboardData, DashboardDataError, DashboardDataService, Dataset,
    SeriesKey, render_chart,
};
pub use executor::{AggregationExecutor, PipelineError};
pub use pipeline::{GROUP_LIMIT, RAW_RECORD_LIMIT, SOURCE_RECORD_LIMIT, build_pipeline};
pub use transform::{ChartSeries, TransformError, transform};

pub use crate::data::types::{
    Accumulator, AggregateKind, ChartConfig, ChartSpec, ChartType, ResultRow, Stage,
};

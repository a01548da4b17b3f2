//! Dashboard data orchestrator
//!
//! Builds, runs, transforms and colors every chart of a dashboard. A chart
//! that fails is logged and rendered as an empty dataset; only the dashboard
//! lookup itself can fail the request.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::colors::chart_colors;
use super::executor::AggregationExecutor;
use super::pipeline::build_pipeline;
use super::transform::{ChartSeries, transform};
use crate::data::DataError;
use crate::data::traits::{RecordStore, TransactionalRepository};
use crate::data::types::ChartSpec;

#[derive(Error, Debug)]
pub enum DashboardDataError {
    #[error("Dashboard not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Repository(#[from] DataError),
}

/// How entries of the dashboard data map are keyed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKey {
    /// Chart id (unique within a dashboard)
    #[default]
    Id,
    /// Chart title; a later chart with the same title replaces an earlier one
    Title,
}

/// One dataset in the front-end charting format
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    /// Placeholder for a chart with nothing to plot
    pub fn empty(title: &str) -> Self {
        Self {
            labels: Vec::new(),
            datasets: vec![Dataset {
                label: title.to_string(),
                data: Vec::new(),
                background_color: None,
                border_color: None,
                border_width: None,
            }],
        }
    }
}

/// Rendered chart as returned by the dashboard data endpoint
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChartPayload {
    pub title: String,
    #[serde(rename = "type")]
    pub chart_type: String,
    pub data: ChartData,
}

/// Rendered charts in dashboard order
pub type DashboardData = IndexMap<String, ChartPayload>;

/// Decorate a series with colors; pie slices get no contrasting border
pub fn render_chart(chart: &ChartSpec, series: ChartSeries) -> ChartData {
    if series.is_empty() {
        return ChartData::empty(&chart.title);
    }

    let colors = chart_colors(series.len());
    let border = if chart.chart_type.is_pie() {
        colors.background.clone()
    } else {
        colors.border
    };

    ChartData {
        labels: series.labels,
        datasets: vec![Dataset {
            label: chart.title.clone(),
            data: series.values,
            background_color: Some(colors.background),
            border_color: Some(border),
            border_width: Some(1),
        }],
    }
}

/// Computes chart data for whole dashboards
pub struct DashboardDataService {
    repository: Arc<dyn TransactionalRepository>,
    executor: AggregationExecutor,
}

impl DashboardDataService {
    pub fn new(
        repository: Arc<dyn TransactionalRepository>,
        store: Arc<dyn RecordStore>,
        server_side_aggregation: bool,
    ) -> Self {
        Self {
            repository,
            executor: AggregationExecutor::new(store, server_side_aggregation),
        }
    }

    /// Render one chart, degrading any failure to the empty dataset
    pub async fn chart_data(&self, org_id: &str, chart: &ChartSpec) -> ChartData {
        let stages = build_pipeline(chart);

        let rows = match self.executor.run(org_id, &stages).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(
                    org_id,
                    chart_id = %chart.id,
                    data_source = %chart.data_source,
                    error = %e,
                    "Chart aggregation failed"
                );
                return ChartData::empty(&chart.title);
            }
        };

        match transform(chart, &rows) {
            Ok(series) => render_chart(chart, series),
            Err(e) => {
                tracing::warn!(org_id, chart_id = %chart.id, error = %e, "Chart transform failed");
                ChartData::empty(&chart.title)
            }
        }
    }

    /// Render every chart of a dashboard owned by `org_id`, in stored order
    pub async fn get_dashboard_data(
        &self,
        org_id: &str,
        dashboard_id: &str,
        key: SeriesKey,
    ) -> Result<DashboardData, DashboardDataError> {
        let dashboard = self
            .repository
            .get_dashboard(org_id, dashboard_id)
            .await?
            .ok_or_else(|| DashboardDataError::NotFound(dashboard_id.to_string()))?;

        let mut result = DashboardData::with_capacity(dashboard.charts.len());
        for chart in &dashboard.charts {
            let data = self.chart_data(org_id, chart).await;
            let entry_key = match key {
                SeriesKey::Id => chart.id.clone(),
                SeriesKey::Title => chart.title.clone(),
            };
            result.insert(
                entry_key,
                ChartPayload {
                    title: chart.title.clone(),
                    chart_type: chart.chart_type.as_str().to_string(),
                    data,
                },
            );
        }

        tracing::debug!(org_id, dashboard_id, charts = result.len(), "Dashboard data computed");
        Ok(result)
    }
}

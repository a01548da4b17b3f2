//! Dashboard API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::core::constants::DASHBOARD_MAX_CHARTS;
use crate::data::types::{ChartConfig, ChartSpec, ChartType, DashboardRow};
use crate::domain::SeriesKey;

/// Dashboard DTO for API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardDto {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub description: Option<String>,
    pub charts: Vec<ChartSpec>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DashboardRow> for DashboardDto {
    fn from(row: DashboardRow) -> Self {
        Self {
            id: row.id,
            organization_id: row.organization_id,
            name: row.name,
            description: row.description,
            charts: row.charts,
            created_at: DateTime::from_timestamp(row.created_at, 0).unwrap_or_else(Utc::now),
            updated_at: DateTime::from_timestamp(row.updated_at, 0).unwrap_or_else(Utc::now),
        }
    }
}

/// Dashboard list entry
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardSummaryDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub charts_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DashboardRow> for DashboardSummaryDto {
    fn from(row: DashboardRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            charts_count: row.charts.len(),
            created_at: DateTime::from_timestamp(row.created_at, 0).unwrap_or_else(Utc::now),
            updated_at: DateTime::from_timestamp(row.updated_at, 0).unwrap_or_else(Utc::now),
        }
    }
}

/// Chart as submitted by clients
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ChartInput {
    /// Existing chart id; omit to have one generated
    #[serde(default)]
    #[validate(length(max = 256, message = "Chart id must be at most 256 characters"))]
    pub id: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Chart title must be 1-200 characters"))]
    pub title: String,

    /// Renderer type, e.g. `bar`, `line`, `pie`
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 50, message = "Chart type must be 1-50 characters"))]
    pub chart_type: String,

    #[validate(length(min = 1, max = 200, message = "Data source must be 1-200 characters"))]
    pub data_source: String,

    #[serde(default)]
    pub config: Option<ChartConfig>,
}

impl From<ChartInput> for ChartSpec {
    fn from(input: ChartInput) -> Self {
        Self {
            id: input.id.unwrap_or_default(),
            title: input.title,
            chart_type: ChartType::from(input.chart_type),
            data_source: input.data_source,
            config: input.config,
        }
    }
}

fn validate_chart_count(charts: &[ChartInput]) -> Result<(), ValidationError> {
    if charts.is_empty() {
        return Err(ValidationError::new("charts_min")
            .with_message("A dashboard needs at least one chart".into()));
    }
    if charts.len() > DASHBOARD_MAX_CHARTS {
        return Err(ValidationError::new("charts_max").with_message(
            format!("A dashboard holds at most {} charts", DASHBOARD_MAX_CHARTS).into(),
        ));
    }
    Ok(())
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("Name must not be blank".into()));
    }
    Ok(())
}

/// Request body for creating or replacing a dashboard
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DashboardRequest {
    #[validate(
        length(min = 1, max = 100, message = "Name must be 1-100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_chart_count"), nested)]
    pub charts: Vec<ChartInput>,
}

impl DashboardRequest {
    /// Trimmed name and a description with blanks dropped
    pub fn normalized(self) -> (String, Option<String>, Vec<ChartSpec>) {
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        let charts = self.charts.into_iter().map(ChartSpec::from).collect();
        (self.name.trim().to_string(), description, charts)
    }
}

/// Query params for dashboard data
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DashboardDataQuery {
    /// Key entries by chart `id` (default) or by `title`
    #[serde(default)]
    pub key: SeriesKey,
}

/// Result of removing a single chart
#[derive(Debug, Serialize, ToSchema)]
pub struct RemoveChartResponse {
    /// True when the removed chart was the last one and the dashboard is gone
    pub dashboard_deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart_json(title: &str) -> serde_json::Value {
        serde_json::json!({
            "title": title,
            "type": "bar",
            "data_source": "sales",
            "config": {"group_by": "region", "measure": "revenue", "aggregate": "sum"}
        })
    }

    #[test]
    fn test_request_validation() {
        let ok: DashboardRequest = serde_json::from_value(serde_json::json!({
            "name": "Sales",
            "charts": [chart_json("Revenue")]
        }))
        .unwrap();
        assert!(ok.validate().is_ok());

        let empty_name: DashboardRequest =
            serde_json::from_value(serde_json::json!({"name": ""})).unwrap();
        assert!(empty_name.validate().is_err());

        let blank_name: DashboardRequest =
            serde_json::from_value(serde_json::json!({"name": "   "})).unwrap();
        assert!(blank_name.validate().is_err());

        let bad_chart: DashboardRequest = serde_json::from_value(serde_json::json!({
            "name": "Sales",
            "charts": [chart_json("")]
        }))
        .unwrap();
        assert!(bad_chart.validate().is_err());

        let too_many: DashboardRequest = serde_json::from_value(serde_json::json!({
            "name": "Sales",
            "charts": vec![chart_json("x"); DASHBOARD_MAX_CHARTS + 1]
        }))
        .unwrap();
        assert!(too_many.validate().is_err());

        let no_charts: DashboardRequest = serde_json::from_value(serde_json::json!({
            "name": "Sales",
            "charts": []
        }))
        .unwrap();
        assert!(no_charts.validate().is_err());

        let charts_omitted: DashboardRequest =
            serde_json::from_value(serde_json::json!({"name": "Sales"})).unwrap();
        assert!(charts_omitted.validate().is_err());
    }

    #[test]
    fn test_normalized_request() {
        let request: DashboardRequest = serde_json::from_value(serde_json::json!({
            "name": "  Sales  ",
            "description": "   ",
            "charts": [chart_json("Revenue")]
        }))
        .unwrap();
        let (name, description, charts) = request.normalized();
        assert_eq!(name, "Sales");
        assert_eq!(description, None);
        assert_eq!(charts[0].id, "");
        assert_eq!(charts[0].chart_type, ChartType::Bar);
        assert!(charts[0].config.as_ref().unwrap().is_grouped());
    }

    #[test]
    fn test_data_query_key() {
        let query: DashboardDataQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(query.key, SeriesKey::Id);
        let query: DashboardDataQuery =
            serde_json::from_value(serde_json::json!({"key": "title"})).unwrap();
        assert_eq!(query.key, SeriesKey::Title);
    }
}

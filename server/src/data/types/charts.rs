//! Chart definitions embedded in dashboards

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Chart renderer type
///
/// Known types get their own variant; anything else is kept verbatim so the
/// front end can decide how to draw it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChartType {
    Line,
    Bar,
    Pie,
    Doughnut,
    Other(String),
}

impl ChartType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Line => "line",
            Self::Bar => "bar",
            Self::Pie => "pie",
            Self::Doughnut => "doughnut",
            Self::Other(s) => s,
        }
    }

    /// Pie slices are drawn without a contrasting border
    pub fn is_pie(&self) -> bool {
        matches!(self, Self::Pie)
    }
}

impl From<String> for ChartType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "line" => Self::Line,
            "bar" => Self::Bar,
            "pie" => Self::Pie,
            "doughnut" => Self::Doughnut,
            _ => Self::Other(s),
        }
    }
}

impl From<ChartType> for String {
    fn from(t: ChartType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a group's measure values are reduced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AggregateKind {
    Sum,
    Avg,
    Count,
    Min,
    Max,
    /// First observed value in the group
    #[default]
    None,
}

impl AggregateKind {
    /// Parse from string; unrecognized kinds fall back to `None`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "sum" => Self::Sum,
            "avg" => Self::Avg,
            "count" => Self::Count,
            "min" => Self::Min,
            "max" => Self::Max,
            _ => Self::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
            Self::None => "none",
        }
    }
}

impl From<String> for AggregateKind {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<AggregateKind> for String {
    fn from(k: AggregateKind) -> Self {
        k.as_str().to_string()
    }
}

/// Grouping configuration of a chart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartConfig {
    /// Field to group by; empty disables grouping
    #[serde(default)]
    pub group_by: String,
    /// Field to aggregate; empty disables grouping
    #[serde(default)]
    pub measure: String,
    #[serde(default)]
    #[schema(value_type = String, example = "sum")]
    pub aggregate: AggregateKind,
}

impl ChartConfig {
    /// Both axes configured
    pub fn is_grouped(&self) -> bool {
        !self.group_by.trim().is_empty() && !self.measure.trim().is_empty()
    }
}

/// Chart definition as stored inside a dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartSpec {
    /// Stable identifier, generated when the chart is first stored
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    #[schema(value_type = String, example = "bar")]
    pub chart_type: ChartType,
    /// Data source name; may dangle after the source is deleted
    pub data_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ChartConfig>,
}

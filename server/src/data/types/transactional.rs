//! Row types for organizations, API keys, data sources and dashboards

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use super::charts::ChartSpec;

// ============================================================================
// Organization types
// ============================================================================

/// Organization row from database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationRow {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub created_at: i64,
    pub updated_at: i64,
}

// ============================================================================
// API Key types
// ============================================================================

/// API key row from database (the hash never leaves the repository)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyRow {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub key_prefix: String,
    pub last_used_at: Option<i64>,
    pub expires_at: Option<i64>,
    pub created_at: i64,
}

/// API key validation result (for auth lookups)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyValidation {
    pub key_id: String,
    pub organization_id: String,
    pub last_used_at: Option<i64>,
    pub expires_at: Option<i64>,
}

impl ApiKeyValidation {
    /// True once `now` has passed the key's expiry
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|exp| now > exp)
    }
}

// ============================================================================
// Data source types
// ============================================================================

/// How a data source was populated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    File,
    #[default]
    Api,
    Sample,
}

impl SourceType {
    /// Parse from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "file" => Some(Self::File),
            "api" => Some(Self::Api),
            "sample" => Some(Self::Sample),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Api => "api",
            Self::Sample => "sample",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Data source row from database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceRow {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub description: Option<String>,
    pub source_type: SourceType,
    /// Union of field names seen so far, in first-seen order
    pub columns: Vec<String>,
    pub record_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

// ============================================================================
// Dashboard types
// ============================================================================

/// Dashboard row from database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardRow {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub description: Option<String>,
    pub charts: Vec<ChartSpec>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Outcome of removing a single chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartRemoval {
    /// Chart removed, dashboard still has charts
    Removed,
    /// The last chart was removed, so the dashboard was deleted too
    DashboardDeleted,
    ChartNotFound,
    DashboardNotFound,
}

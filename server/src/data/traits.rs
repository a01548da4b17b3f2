//! Repository traits
//!
//! `TransactionalRepository` covers organizations, API keys, data sources and
//! dashboards. `RecordStore` is the read-only record facade the chart
//! pipeline runs against.

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::types::{
    ApiKeyRow, ApiKeyValidation, ChartRemoval, ChartSpec, DashboardRow, DataSourceRow,
    OrganizationRow, RecordData, ResultRow, SourceType, Stage, StoredRecord,
};

// ============================================================================
// Record Store Trait
// ============================================================================

/// Read-only query facade over an organization's records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Records of one data source in insertion order, at most `limit`
    async fn query_records(
        &self,
        org_id: &str,
        data_source: &str,
        limit: usize,
    ) -> Result<Vec<StoredRecord>, DataError>;

    /// Evaluate a complete stage list natively
    ///
    /// Returns `Ok(None)` when the store cannot run this stage list, in which
    /// case the caller evaluates it in memory on top of `query_records`.
    async fn aggregate(
        &self,
        _org_id: &str,
        _stages: &[Stage],
    ) -> Result<Option<Vec<ResultRow>>, DataError> {
        Ok(None)
    }
}

// ============================================================================
// Transactional Repository Trait
// ============================================================================

/// Repository trait for organizations, API keys, data sources and dashboards
#[async_trait]
pub trait TransactionalRepository: Send + Sync {
    // ==================== Organization Operations ====================

    async fn create_organization(&self, name: &str, slug: &str)
    -> Result<OrganizationRow, DataError>;

    async fn get_organization(&self, id: &str) -> Result<Option<OrganizationRow>, DataError>;

    // ==================== API Key Operations ====================

    /// Store a new API key (hash only)
    async fn create_api_key(
        &self,
        org_id: &str,
        name: &str,
        key_hash: &str,
        key_prefix: &str,
        expires_at: Option<i64>,
    ) -> Result<ApiKeyRow, DataError>;

    /// Key metadata for an organization, newest first
    async fn list_api_keys(&self, org_id: &str) -> Result<Vec<ApiKeyRow>, DataError>;

    /// Revoke a key; false when it does not exist in this organization
    async fn delete_api_key(&self, org_id: &str, id: &str) -> Result<bool, DataError>;

    /// Resolve a key hash to its organization
    async fn get_api_key_by_hash(
        &self,
        key_hash: &str,
    ) -> Result<Option<ApiKeyValidation>, DataError>;

    /// Record that a key was used
    async fn touch_api_key(&self, key_id: &str) -> Result<(), DataError>;

    // ==================== Data Source Operations ====================

    async fn list_data_sources(&self, org_id: &str) -> Result<Vec<DataSourceRow>, DataError>;

    async fn get_data_source(
        &self,
        org_id: &str,
        id: &str,
    ) -> Result<Option<DataSourceRow>, DataError>;

    /// Delete a data source and, by cascade, its records
    async fn delete_data_source(&self, org_id: &str, id: &str) -> Result<bool, DataError>;

    /// Append one record, creating the data source on first use
    async fn append_record(
        &self,
        org_id: &str,
        data_source: &str,
        source_type: SourceType,
        data: &RecordData,
    ) -> Result<(DataSourceRow, StoredRecord), DataError>;

    /// Create a data source with all its records in one transaction
    ///
    /// Returns `None` without writing anything if the name is already taken.
    async fn create_data_source_with_records(
        &self,
        org_id: &str,
        name: &str,
        description: Option<&str>,
        source_type: SourceType,
        records: &[RecordData],
    ) -> Result<Option<DataSourceRow>, DataError>;

    /// Page through a data source's records in insertion order
    async fn list_records(
        &self,
        org_id: &str,
        data_source_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<StoredRecord>, u64), DataError>;

    // ==================== Dashboard Operations ====================

    async fn list_dashboards(&self, org_id: &str) -> Result<Vec<DashboardRow>, DataError>;

    /// Get a dashboard owned by the organization
    async fn get_dashboard(&self, org_id: &str, id: &str)
    -> Result<Option<DashboardRow>, DataError>;

    async fn create_dashboard(
        &self,
        org_id: &str,
        name: &str,
        description: Option<&str>,
        charts: &[ChartSpec],
    ) -> Result<DashboardRow, DataError>;

    async fn update_dashboard(
        &self,
        org_id: &str,
        id: &str,
        name: &str,
        description: Option<&str>,
        charts: &[ChartSpec],
    ) -> Result<Option<DashboardRow>, DataError>;

    async fn delete_dashboard(&self, org_id: &str, id: &str) -> Result<bool, DataError>;

    /// Remove one chart; removing the last chart deletes the dashboard
    async fn remove_chart(
        &self,
        org_id: &str,
        dashboard_id: &str,
        chart_id: &str,
    ) -> Result<ChartRemoval, DataError>;
}

//! Repository trait implementations for SQLite
//!
//! Implements `TransactionalRepository` and `RecordStore` for `Arc<SqliteService>`
//! by delegating to the free functions in `repositories`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::traits::{RecordStore, TransactionalRepository};
use crate::data::types::{
    ApiKeyRow, ApiKeyValidation, ChartRemoval, ChartSpec, DashboardRow, DataSourceRow,
    OrganizationRow, RecordData, ResultRow, SourceType, Stage, StoredRecord,
};

use super::SqliteService;
use super::aggregate;
use super::repositories::{api_key, dashboard, data_source, organization, record};

#[async_trait]
impl TransactionalRepository for Arc<SqliteService> {
    // ==================== Organization Operations ====================

    async fn create_organization(
        &self,
        name: &str,
        slug: &str,
    ) -> Result<OrganizationRow, DataError> {
        organization::create_organization(self.pool(), name, slug)
            .await
            .map_err(Into::into)
    }

    async fn get_organization(&self, id: &str) -> Result<Option<OrganizationRow>, DataError> {
        organization::get_organization(self.pool(), id)
            .await
            .map_err(Into::into)
    }

    // ==================== API Key Operations ====================

    async fn create_api_key(
        &self,
        org_id: &str,
        name: &str,
        key_hash: &str,
        key_prefix: &str,
        expires_at: Option<i64>,
    ) -> Result<ApiKeyRow, DataError> {
        api_key::create_api_key(self.pool(), org_id, name, key_hash, key_prefix, expires_at)
            .await
            .map_err(Into::into)
    }

    async fn list_api_keys(&self, org_id: &str) -> Result<Vec<ApiKeyRow>, DataError> {
        api_key::list_for_org(self.pool(), org_id)
            .await
            .map_err(Into::into)
    }

    async fn delete_api_key(&self, org_id: &str, id: &str) -> Result<bool, DataError> {
        api_key::delete_api_key(self.pool(), org_id, id)
            .await
            .map_err(Into::into)
    }

    async fn get_api_key_by_hash(
        &self,
        key_hash: &str,
    ) -> Result<Option<ApiKeyValidation>, DataError> {
        api_key::get_by_hash(self.pool(), key_hash)
            .await
            .map_err(Into::into)
    }

    async fn touch_api_key(&self, key_id: &str) -> Result<(), DataError> {
        api_key::touch_api_key(self.pool(), key_id)
            .await
            .map_err(Into::into)
    }

    // ==================== Data Source Operations ====================

    async fn list_data_sources(&self, org_id: &str) -> Result<Vec<DataSourceRow>, DataError> {
        data_source::list_for_org(self.pool(), org_id)
            .await
            .map_err(Into::into)
    }

    async fn get_data_source(
        &self,
        org_id: &str,
        id: &str,
    ) -> Result<Option<DataSourceRow>, DataError> {
        data_source::get_data_source(self.pool(), org_id, id)
            .await
            .map_err(Into::into)
    }

    async fn delete_data_source(&self, org_id: &str, id: &str) -> Result<bool, DataError> {
        data_source::delete_data_source(self.pool(), org_id, id)
            .await
            .map_err(Into::into)
    }

    async fn append_record(
        &self,
        org_id: &str,
        data_source: &str,
        source_type: SourceType,
        data: &RecordData,
    ) -> Result<(DataSourceRow, StoredRecord), DataError> {
        record::append_record(self.pool(), org_id, data_source, source_type, data)
            .await
            .map_err(Into::into)
    }

    async fn create_data_source_with_records(
        &self,
        org_id: &str,
        name: &str,
        description: Option<&str>,
        source_type: SourceType,
        records: &[RecordData],
    ) -> Result<Option<DataSourceRow>, DataError> {
        data_source::create_with_records(
            self.pool(),
            org_id,
            name,
            description,
            source_type,
            records,
        )
        .await
        .map_err(Into::into)
    }

    async fn list_records(
        &self,
        org_id: &str,
        data_source_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<StoredRecord>, u64), DataError> {
        record::list_records(self.pool(), org_id, data_source_id, page, limit)
            .await
            .map_err(Into::into)
    }

    // ==================== Dashboard Operations ====================

    async fn list_dashboards(&self, org_id: &str) -> Result<Vec<DashboardRow>, DataError> {
        dashboard::list_for_org(self.pool(), org_id)
            .await
            .map_err(Into::into)
    }

    async fn get_dashboard(
        &self,
        org_id: &str,
        id: &str,
    ) -> Result<Option<DashboardRow>, DataError> {
        dashboard::get_dashboard(self.pool(), org_id, id)
            .await
            .map_err(Into::into)
    }

    async fn create_dashboard(
        &self,
        org_id: &str,
        name: &str,
        description: Option<&str>,
        charts: &[ChartSpec],
    ) -> Result<DashboardRow, DataError> {
        dashboard::create_dashboard(self.pool(), org_id, name, description, charts)
            .await
            .map_err(Into::into)
    }

    async fn update_dashboard(
        &self,
        org_id: &str,
        id: &str,
        name: &str,
        description: Option<&str>,
        charts: &[ChartSpec],
    ) -> Result<Option<DashboardRow>, DataError> {
        dashboard::update_dashboard(self.pool(), org_id, id, name, description, charts)
            .await
            .map_err(Into::into)
    }

    async fn delete_dashboard(&self, org_id: &str, id: &str) -> Result<bool, DataError> {
        dashboard::delete_dashboard(self.pool(), org_id, id)
            .await
            .map_err(Into::into)
    }

    async fn remove_chart(
        &self,
        org_id: &str,
        dashboard_id: &str,
        chart_id: &str,
    ) -> Result<ChartRemoval, DataError> {
        dashboard::remove_chart(self.pool(), org_id, dashboard_id, chart_id)
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl RecordStore for Arc<SqliteService> {
    async fn query_records(
        &self,
        org_id: &str,
        data_source: &str,
        limit: usize,
    ) -> Result<Vec<StoredRecord>, DataError> {
        record::query_records(self.pool(), org_id, data_source, limit)
            .await
            .map_err(Into::into)
    }

    async fn aggregate(
        &self,
        org_id: &str,
        stages: &[Stage],
    ) -> Result<Option<Vec<ResultRow>>, DataError> {
        aggregate::aggregate(self.pool(), org_id, stages)
            .await
            .map_err(Into::into)
    }
}

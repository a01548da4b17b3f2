//! Data source API endpoints
//!
//! Records are append-only; a data source and its records are removed together.

pub mod types;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use crate::api::auth::Auth;
use crate::api::extractors::{IdPath, ValidatedJson, ValidatedQuery};
use crate::api::types::{ApiError, PaginatedResponse};
use crate::data::types::SourceType;
use crate::data::{SqliteService, TransactionalRepository};
use crate::domain::{SeedReport, seed_samples};

use types::{DataSourceDto, ListRecordsQuery, RecordDto, StreamRecordRequest, StreamRecordResponse};

/// Shared state for Data API endpoints
#[derive(Clone)]
pub struct DataApiState {
    pub database: Arc<SqliteService>,
}

/// Build Data API routes
pub fn routes(database: Arc<SqliteService>) -> Router<()> {
    let state = DataApiState { database };

    Router::new()
        .route("/sources", get(list_sources))
        .route("/sources/{id}", delete(delete_source))
        .route("/sources/{id}/records", get(list_records))
        .route("/stream", post(stream_record))
        .route("/samples", post(seed_sample_sources))
        .with_state(state)
}

fn source_not_found(id: &str) -> ApiError {
    ApiError::not_found(
        "DATA_SOURCE_NOT_FOUND",
        format!("Data source not found: {}", id),
    )
}

/// List the organization's data sources
#[utoipa::path(
    get,
    path = "/api/v1/data/sources",
    tag = "data",
    responses(
        (status = 200, description = "Data sources", body = Vec<DataSourceDto>)
    )
)]
pub async fn list_sources(
    State(state): State<DataApiState>,
    auth: Auth,
) -> Result<Json<Vec<DataSourceDto>>, ApiError> {
    let sources = state
        .database
        .list_data_sources(auth.org_id())
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(sources.into_iter().map(DataSourceDto::from).collect()))
}

/// Append one record to a data source
///
/// The data source is created on first use.
#[utoipa::path(
    post,
    path = "/api/v1/data/stream",
    tag = "data",
    request_body = StreamRecordRequest,
    responses(
        (status = 201, description = "Record stored", body = StreamRecordResponse),
        (status = 400, description = "Invalid record")
    )
)]
pub async fn stream_record(
    State(state): State<DataApiState>,
    auth: Auth,
    ValidatedJson(body): ValidatedJson<StreamRecordRequest>,
) -> Result<(StatusCode, Json<StreamRecordResponse>), ApiError> {
    let data_source = body.data_source.trim();
    if data_source.is_empty() {
        return Err(ApiError::bad_request(
            "VALIDATION_ERROR",
            "Data source must not be blank",
        ));
    }

    let (source, record) = state
        .database
        .append_record(auth.org_id(), data_source, SourceType::Api, &body.data)
        .await
        .map_err(ApiError::from_data)?;

    tracing::debug!(
        org_id = %auth.org_id(),
        key_id = ?auth.ctx.key_id(),
        data_source = %source.name,
        record_count = source.record_count,
        "Record appended"
    );
    Ok((
        StatusCode::CREATED,
        Json(StreamRecordResponse {
            data_source: DataSourceDto::from(source),
            record: RecordDto::from(record),
        }),
    ))
}

/// Page through a data source's records in insertion order
#[utoipa::path(
    get,
    path = "/api/v1/data/sources/{id}/records",
    tag = "data",
    params(
        ("id" = String, Path, description = "Data source ID"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("limit" = Option<u32>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Records with pagination metadata"),
        (status = 404, description = "Data source not found")
    )
)]
pub async fn list_records(
    State(state): State<DataApiState>,
    auth: Auth,
    path: IdPath,
    ValidatedQuery(query): ValidatedQuery<ListRecordsQuery>,
) -> Result<Json<PaginatedResponse<RecordDto>>, ApiError> {
    state
        .database
        .get_data_source(auth.org_id(), &path.id)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| source_not_found(&path.id))?;

    let (records, total) = state
        .database
        .list_records(auth.org_id(), &path.id, query.page, query.limit)
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(PaginatedResponse::new(
        records.into_iter().map(RecordDto::from).collect(),
        query.page,
        query.limit,
        total,
    )))
}

/// Delete a data source and all its records
///
/// Charts that reference it render empty until a source with the same name exists again.
#[utoipa::path(
    delete,
    path = "/api/v1/data/sources/{id}",
    tag = "data",
    params(
        ("id" = String, Path, description = "Data source ID")
    ),
    responses(
        (status = 204, description = "Data source deleted"),
        (status = 404, description = "Data source not found")
    )
)]
pub async fn delete_source(
    State(state): State<DataApiState>,
    auth: Auth,
    path: IdPath,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .database
        .delete_data_source(auth.org_id(), &path.id)
        .await
        .map_err(ApiError::from_data)?;

    if !deleted {
        return Err(source_not_found(&path.id));
    }

    tracing::info!(org_id = %auth.org_id(), data_source_id = %path.id, "Data source deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Create the built-in sample data sources
///
/// Sources whose name is already taken are skipped.
#[utoipa::path(
    post,
    path = "/api/v1/data/samples",
    tag = "data",
    responses(
        (status = 200, description = "Created and skipped sample sources", body = SeedReport)
    )
)]
pub async fn seed_sample_sources(
    State(state): State<DataApiState>,
    auth: Auth,
) -> Result<Json<SeedReport>, ApiError> {
    let report = seed_samples(&state.database, auth.org_id())
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(report))
}

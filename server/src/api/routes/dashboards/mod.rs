//! Dashboard API endpoints

pub mod types;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};

use crate::api::auth::Auth;
use crate::api::extractors::{ChartPath, IdPath, ValidatedJson, ValidatedQuery};
use crate::api::types::ApiError;
use crate::data::types::ChartRemoval;
use crate::data::{SqliteService, TransactionalRepository};
use crate::domain::DashboardDataService;
use crate::domain::charts::{DashboardData, DashboardDataError};

use types::{
    DashboardDataQuery, DashboardDto, DashboardRequest, DashboardSummaryDto, RemoveChartResponse,
};

/// Shared state for Dashboards API endpoints
#[derive(Clone)]
pub struct DashboardsApiState {
    pub database: Arc<SqliteService>,
    pub dashboard_data: Arc<DashboardDataService>,
}

/// Build Dashboards API routes
pub fn routes(
    database: Arc<SqliteService>,
    dashboard_data: Arc<DashboardDataService>,
) -> Router<()> {
    let state = DashboardsApiState {
        database,
        dashboard_data,
    };

    Router::new()
        .route("/", get(list_dashboards).post(create_dashboard))
        .route(
            "/{id}",
            get(get_dashboard)
                .put(update_dashboard)
                .delete(delete_dashboard),
        )
        .route("/{id}/data", get(get_dashboard_data))
        .route("/{id}/charts/{chart_id}", delete(remove_chart))
        .with_state(state)
}

fn dashboard_not_found(id: &str) -> ApiError {
    ApiError::not_found(
        "DASHBOARD_NOT_FOUND",
        format!("Dashboard not found: {}", id),
    )
}

/// List the organization's dashboards
#[utoipa::path(
    get,
    path = "/api/v1/dashboards",
    tag = "dashboards",
    responses(
        (status = 200, description = "Dashboards, newest first", body = Vec<DashboardSummaryDto>)
    )
)]
pub async fn list_dashboards(
    State(state): State<DashboardsApiState>,
    auth: Auth,
) -> Result<Json<Vec<DashboardSummaryDto>>, ApiError> {
    let dashboards = state
        .database
        .list_dashboards(auth.org_id())
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(
        dashboards
            .into_iter()
            .map(DashboardSummaryDto::from)
            .collect(),
    ))
}

/// Create a dashboard
#[utoipa::path(
    post,
    path = "/api/v1/dashboards",
    tag = "dashboards",
    request_body = DashboardRequest,
    responses(
        (status = 201, description = "Dashboard created", body = DashboardDto),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Dashboard name already in use")
    )
)]
pub async fn create_dashboard(
    State(state): State<DashboardsApiState>,
    auth: Auth,
    ValidatedJson(body): ValidatedJson<DashboardRequest>,
) -> Result<(StatusCode, Json<DashboardDto>), ApiError> {
    let (name, description, charts) = body.normalized();

    let dashboard = state
        .database
        .create_dashboard(auth.org_id(), &name, description.as_deref(), &charts)
        .await
        .map_err(ApiError::from_data)?;

    tracing::info!(
        org_id = %auth.org_id(),
        key_id = ?auth.ctx.key_id(),
        dashboard_id = %dashboard.id,
        charts = dashboard.charts.len(),
        "Dashboard created"
    );
    Ok((StatusCode::CREATED, Json(DashboardDto::from(dashboard))))
}

/// Get a single dashboard
#[utoipa::path(
    get,
    path = "/api/v1/dashboards/{id}",
    tag = "dashboards",
    params(
        ("id" = String, Path, description = "Dashboard ID")
    ),
    responses(
        (status = 200, description = "Dashboard details", body = DashboardDto),
        (status = 404, description = "Dashboard not found")
    )
)]
pub async fn get_dashboard(
    State(state): State<DashboardsApiState>,
    auth: Auth,
    path: IdPath,
) -> Result<Json<DashboardDto>, ApiError> {
    let dashboard = state
        .database
        .get_dashboard(auth.org_id(), &path.id)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| dashboard_not_found(&path.id))?;

    Ok(Json(DashboardDto::from(dashboard)))
}

/// Replace a dashboard's name, description and charts
///
/// Charts submitted with their existing `id` keep it.
#[utoipa::path(
    put,
    path = "/api/v1/dashboards/{id}",
    tag = "dashboards",
    params(
        ("id" = String, Path, description = "Dashboard ID")
    ),
    request_body = DashboardRequest,
    responses(
        (status = 200, description = "Dashboard updated", body = DashboardDto),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Dashboard not found"),
        (status = 409, description = "Dashboard name already in use")
    )
)]
pub async fn update_dashboard(
    State(state): State<DashboardsApiState>,
    auth: Auth,
    path: IdPath,
    ValidatedJson(body): ValidatedJson<DashboardRequest>,
) -> Result<Json<DashboardDto>, ApiError> {
    let (name, description, charts) = body.normalized();

    let dashboard = state
        .database
        .update_dashboard(
            auth.org_id(),
            &path.id,
            &name,
            description.as_deref(),
            &charts,
        )
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| dashboard_not_found(&path.id))?;

    Ok(Json(DashboardDto::from(dashboard)))
}

/// Delete a dashboard
#[utoipa::path(
    delete,
    path = "/api/v1/dashboards/{id}",
    tag = "dashboards",
    params(
        ("id" = String, Path, description = "Dashboard ID")
    ),
    responses(
        (status = 204, description = "Dashboard deleted"),
        (status = 404, description = "Dashboard not found")
    )
)]
pub async fn delete_dashboard(
    State(state): State<DashboardsApiState>,
    auth: Auth,
    path: IdPath,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .database
        .delete_dashboard(auth.org_id(), &path.id)
        .await
        .map_err(ApiError::from_data)?;

    if !deleted {
        return Err(dashboard_not_found(&path.id));
    }

    tracing::info!(org_id = %auth.org_id(), dashboard_id = %path.id, "Dashboard deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Compute chart data for every chart of a dashboard
///
/// Charts whose data cannot be computed are returned with an empty dataset.
#[utoipa::path(
    get,
    path = "/api/v1/dashboards/{id}/data",
    tag = "dashboards",
    params(
        ("id" = String, Path, description = "Dashboard ID"),
        ("key" = Option<String>, Query, description = "Key entries by chart `id` (default) or `title`")
    ),
    responses(
        (status = 200, description = "Chart payloads keyed by chart id or title"),
        (status = 404, description = "Dashboard not found")
    )
)]
pub async fn get_dashboard_data(
    State(state): State<DashboardsApiState>,
    auth: Auth,
    path: IdPath,
    ValidatedQuery(query): ValidatedQuery<DashboardDataQuery>,
) -> Result<Json<DashboardData>, ApiError> {
    let data = state
        .dashboard_data
        .get_dashboard_data(auth.org_id(), &path.id, query.key)
        .await
        .map_err(|e| match e {
            DashboardDataError::NotFound(id) => dashboard_not_found(&id),
            DashboardDataError::Repository(e) => ApiError::from_data(e),
        })?;

    Ok(Json(data))
}

/// Remove a single chart from a dashboard
///
/// Removing the last chart deletes the dashboard.
#[utoipa::path(
    delete,
    path = "/api/v1/dashboards/{id}/charts/{chart_id}",
    tag = "dashboards",
    params(
        ("id" = String, Path, description = "Dashboard ID"),
        ("chart_id" = String, Path, description = "Chart ID")
    ),
    responses(
        (status = 200, description = "Chart removed", body = RemoveChartResponse),
        (status = 404, description = "Dashboard or chart not found")
    )
)]
pub async fn remove_chart(
    State(state): State<DashboardsApiState>,
    auth: Auth,
    path: ChartPath,
) -> Result<Json<RemoveChartResponse>, ApiError> {
    let outcome = state
        .database
        .remove_chart(auth.org_id(), &path.dashboard_id, &path.chart_id)
        .await
        .map_err(ApiError::from_data)?;

    let dashboard_deleted = match outcome {
        ChartRemoval::Removed => false,
        ChartRemoval::DashboardDeleted => true,
        ChartRemoval::DashboardNotFound => return Err(dashboard_not_found(&path.dashboard_id)),
        ChartRemoval::ChartNotFound => {
            return Err(ApiError::not_found(
                "CHART_NOT_FOUND",
                format!("Chart not found: {}", path.chart_id),
            ));
        }
    };

    tracing::info!(
        org_id = %auth.org_id(),
        dashboard_id = %path.dashboard_id,
        chart_id = %path.chart_id,
        dashboard_deleted,
        "Chart removed"
    );
    Ok(Json(RemoveChartResponse { dashboard_deleted }))
}

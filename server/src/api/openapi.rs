//! OpenAPI specification and Swagger UI

use axum::http::header;
use axum::response::{Html, IntoResponse, Json};
use utoipa::OpenApi;

use crate::api::routes::{api_keys, dashboards, data, health};
use crate::api::types::PaginationMeta;
use crate::data::types::{ChartConfig, ChartSpec, SourceType};
use crate::domain::SeedReport;
use crate::domain::charts::{ChartData, ChartPayload, Dataset, SeriesKey};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pulseboard API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Multi-tenant analytics dashboards"
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "dashboards", description = "Dashboards and chart data"),
        (name = "data", description = "Data sources and records"),
        (name = "api-keys", description = "API key management")
    ),
    paths(
        // Health
        health::health,
        // Dashboards
        dashboards::list_dashboards,
        dashboards::create_dashboard,
        dashboards::get_dashboard,
        dashboards::update_dashboard,
        dashboards::delete_dashboard,
        dashboards::get_dashboard_data,
        dashboards::remove_chart,
        // Data
        data::list_sources,
        data::stream_record,
        data::list_records,
        data::delete_source,
        data::seed_sample_sources,
        // API keys
        api_keys::list_api_keys,
        api_keys::create_api_key,
        api_keys::delete_api_key,
    ),
    components(schemas(
        // API types
        PaginationMeta,
        // Health
        health::HealthResponse,
        // Dashboards
        dashboards::types::DashboardDto,
        dashboards::types::DashboardSummaryDto,
        dashboards::types::ChartInput,
        dashboards::types::DashboardRequest,
        dashboards::types::DashboardDataQuery,
        dashboards::types::RemoveChartResponse,
        ChartSpec,
        ChartConfig,
        SeriesKey,
        ChartPayload,
        ChartData,
        Dataset,
        // Data
        data::types::DataSourceDto,
        data::types::RecordDto,
        data::types::StreamRecordRequest,
        data::types::StreamRecordResponse,
        data::types::ListRecordsQuery,
        SourceType,
        SeedReport,
        // API keys
        api_keys::types::CreateApiKeyRequest,
        api_keys::types::CreateApiKeyResponse,
        api_keys::types::ApiKeyDto,
    ))
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}

/// Serve Swagger UI from CDN
pub async fn swagger_ui_html() -> Html<&'static str> {
    Html(SWAGGER_UI_HTML)
}

const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Pulseboard API Documentation</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        html { box-sizing: border-box; overflow-y: scroll; }
        body { margin: 0; background: #fafafa; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = () => {
            window.ui = SwaggerUIBundle({
                url: "/api/openapi.json",
                dom_id: '#swagger-ui',
                deepLinking: true
            });
        };
    </script>
</body>
</html>"#;

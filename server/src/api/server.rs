//! API server initialization

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::auth::{AuthState, require_auth};
use super::middleware;
use super::openapi::{openapi_json, swagger_ui_html};
use super::routes::{api_keys, dashboards, data, health};
use crate::core::constants::DEFAULT_BODY_LIMIT;
use crate::core::{ApiKeySecret, CoreApp};
use crate::data::SqliteService;
use crate::domain::DashboardDataService;

pub struct ApiServer {
    app: CoreApp,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        Self { app }
    }

    /// Returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self { app } = self;

        let shutdown = app.shutdown.clone();
        let addr = SocketAddr::new(app.config.server.host.parse()?, app.config.server.port);

        let router = router(
            app.database.clone(),
            app.api_key_secret.clone(),
            app.config.auth.enabled,
            app.config.charts.server_side_aggregation,
        );

        let listener = TcpListener::bind(addr).await?;
        tracing::debug!(%addr, "HTTP server listening");
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        Ok(app)
    }
}

/// Build the complete HTTP router
///
/// Everything under `/api/v1` except health runs behind `require_auth`.
pub fn router(
    database: Arc<SqliteService>,
    api_key_secret: Arc<ApiKeySecret>,
    auth_enabled: bool,
    server_side_aggregation: bool,
) -> Router {
    let dashboard_data = Arc::new(DashboardDataService::new(
        Arc::new(database.clone()),
        Arc::new(database.clone()),
        server_side_aggregation,
    ));

    let auth_state = AuthState {
        database: database.clone(),
        api_key_secret: api_key_secret.clone(),
        auth_enabled,
    };

    let dashboards_routes = dashboards::routes(database.clone(), dashboard_data).layer(
        axum::middleware::from_fn_with_state(auth_state.clone(), require_auth),
    );
    let data_routes = data::routes(database.clone()).layer(
        axum::middleware::from_fn_with_state(auth_state.clone(), require_auth),
    );
    let api_keys_routes = api_keys::routes(database.clone(), api_key_secret).layer(
        axum::middleware::from_fn_with_state(auth_state, require_auth),
    );

    Router::new()
        .route("/api/v1/health", get(health::health).with_state(database))
        .route("/api/openapi.json", get(openapi_json))
        .route("/api/docs", get(swagger_ui_html))
        .nest("/api/v1/dashboards", dashboards_routes)
        .nest("/api/v1/data", data_routes)
        .nest("/api/v1/api-keys", api_keys_routes)
        .fallback(middleware::handle_404)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
}

//! Route configuration and setup.
//!
//! Upload route groups live in [domains](domains); health checks in [health](health).

mod domains;
mod health;

use crate::middleware::request_id_middleware;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tutora_core::Config;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let public_routes = public_routes(state.clone());
    let protected_routes =
        protected_routes(state.clone()).layer(axum::middleware::from_fn_with_state(
            state.auth.clone(),
            crate::auth::middleware::auth_middleware,
        ));

    let uploads_path = config.uploads_url_path().trim_end_matches('/').to_string();
    let serve_uploads = ServeDir::new(state.upload.pipeline.uploads().base_path());
    tracing::info!(
        path = %uploads_path,
        dir = %state.upload.pipeline.uploads().base_path().display(),
        "Serving upload directory"
    );

    // Multipart framing adds a little on top of the chunk itself.
    let body_limit = config.max_upload_size_bytes() + 64 * 1024;

    let app = public_routes
        .merge(protected_routes)
        .nest_service(&uploads_path, serve_uploads)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}

fn public_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/health",
            get({
                let state = state.clone();
                move || health::health_check(state.clone())
            }),
        )
        .route(
            "/live",
            get({
                let state = state.clone();
                move || health::liveness_check(state.clone())
            }),
        )
        .route(
            "/ready",
            get({
                let state = state.clone();
                move || health::readiness_check(state.clone())
            }),
        )
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
        .with_state(state)
}

fn protected_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .merge(domains::video_routes(state.clone()))
        .merge(domains::upload_session_routes(state.clone()))
        .with_state(state)
}

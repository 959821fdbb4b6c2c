use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::EngineConfig,
    db::CatalogStore,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
};

pub mod recommendations;

/// Shared application state
///
/// Both members are read-only for the life of the process; requests never
/// share mutable data.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub engine: Arc<EngineConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn CatalogStore>, engine: EngineConfig) -> Self {
        Self {
            store,
            engine: Arc::new(engine),
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/recommendations", post(recommendations::recommend))
        .route(
            "/students/:student_id/recommendations",
            get(recommendations::recommend_for_student),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

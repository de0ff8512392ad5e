use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{self, AppState};

/// Account and skill endpoints. Rate limiting and body limits are layered on
/// by the caller.
///
/// Only POST is routed for the skill endpoint; other methods get 405.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/skill", post(handlers::handle_skill_request))
        .route("/api/v1/accounts", get(handlers::list_accounts))
        .route("/api/v1/accounts/refresh", post(handlers::refresh_accounts))
}

/// Full application without the per-IP rate limiter.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

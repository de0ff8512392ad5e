use crate::alexa_models::{SkillRequest, SpeechResponse};
use crate::config::{Config, Credentials};
use crate::errors::AppError;
use crate::models::Account;
use crate::pipeline::ResolutionPipeline;
use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Aggregator login of the account owner this service answers for.
    pub credentials: Credentials,
    /// Account cache, matcher and formatter wired together.
    pub pipeline: Arc<ResolutionPipeline>,
}

/// Health check endpoint.
///
/// Returns the service status, version, and the active matching strategy
/// and cache lifetime.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-bookkeeper-api",
            "version": env!("CARGO_PKG_VERSION"),
            "match_strategy": state.config.match_strategy.as_str(),
            "cache_ttl_secs": state.config.cache_ttl_secs,
        })),
    )
}

/// POST /api/v1/skill
///
/// Answers a voice-assistant intent request with the balance of the account
/// named in its `Account` slot.
///
/// # Returns
///
/// * `Result<Json<SpeechResponse>, AppError>` - The speech response, or an
///   apologetic utterance with a non-200 status.
pub async fn handle_skill_request(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SpeechResponse>, AppError> {
    tracing::info!("POST /skill ({} bytes)", body.len());

    let request = SkillRequest::from_slice(&body)?;
    let response = state.pipeline.respond(&state.credentials, &request).await?;

    Ok(Json(response))
}

/// GET /api/v1/accounts
///
/// Returns the owner's accounts, from cache when fresh.
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Account>>, AppError> {
    tracing::info!("GET /accounts");

    let accounts = state
        .pipeline
        .cache()
        .get_accounts(&state.credentials)
        .await?;

    Ok(Json(accounts.accounts))
}

/// POST /api/v1/accounts/refresh
///
/// Runs the account fetch now and rewrites the local cache, ignoring its age.
/// This does not ask the aggregator to re-pull data from the institutions.
pub async fn refresh_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("POST /accounts/refresh");

    let accounts = state.pipeline.cache().refresh(&state.credentials).await?;

    Ok(Json(json!({
        "status": "refreshed",
        "accounts": accounts.len(),
        "fetched_at": accounts.fetched_at.to_rfc3339(),
    })))
}

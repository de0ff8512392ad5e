use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rust_bookkeeper_api::account_cache::{AccountCache, FileBlobStore};
use rust_bookkeeper_api::config::{Config, Credentials};
use rust_bookkeeper_api::handlers::{self, AppState};
use rust_bookkeeper_api::matcher::matcher_from_config;
use rust_bookkeeper_api::mintapi_client::MintApiFetcher;
use rust_bookkeeper_api::pipeline::ResolutionPipeline;
use rust_bookkeeper_api::routes;

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration and owner credentials.
/// - The account fetcher, on-disk account cache and matcher.
/// - HTTP routes and middleware (CORS, Rate Limiting).
///
/// It then starts the Axum server.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Ok if the server runs successfully, or an error if initialization fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_bookkeeper_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let credentials = Credentials::load(&config.credentials_path)?;
    tracing::info!(
        "Owner credentials loaded from {}",
        config.credentials_path.display()
    );

    let fetcher = Arc::new(MintApiFetcher::new(
        config.mintapi_binary.clone(),
        config.fetch_timeout(),
    ));
    tracing::info!(
        "✓ Account fetcher: {} (timeout {}s)",
        config.mintapi_binary.display(),
        config.fetch_timeout_secs
    );

    let store = Arc::new(FileBlobStore::new(config.cache_dir.clone()));
    let cache = Arc::new(AccountCache::new(fetcher, store).with_ttl(config.cache_ttl()));
    tracing::info!(
        "Account cache initialized at {} ({}s TTL)",
        config.cache_dir.display(),
        config.cache_ttl_secs
    );

    let matcher = matcher_from_config(&config)?;
    tracing::info!("Account matching strategy: {}", matcher.name());

    // Build application state
    let app_state = Arc::new(AppState {
        config: config.clone(),
        credentials,
        pipeline: Arc::new(ResolutionPipeline::new(cache, matcher)),
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    // Build protected routes with security layers
    let protected_routes = routes::api_routes().layer(
        ServiceBuilder::new()
            // Skill requests are a few KB; 1MB is plenty
            .layer(RequestBodyLimitLayer::new(1024 * 1024))
            .layer(GovernorLayer {
                config: governor_conf,
            }),
    );

    // Health check bypasses rate limiting
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

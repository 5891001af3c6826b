pub mod api;
pub mod config;
pub mod data_structures;
pub mod render;

use crate::config::AppConfig;
use crate::data_structures::{SharedAnalyzer, SharedConfig};
use axum::{extract::FromRef, routing::get, Router};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use stock_analyzer::api::AnalyzerBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
struct AppState {
    analyzer: SharedAnalyzer,
    config: SharedConfig,
}

impl FromRef<AppState> for SharedAnalyzer {
    fn from_ref(app_state: &AppState) -> SharedAnalyzer {
        app_state.analyzer.clone()
    }
}

impl FromRef<AppState> for SharedConfig {
    fn from_ref(app_state: &AppState) -> SharedConfig {
        app_state.config.clone()
    }
}

fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/", get(api::dashboard_handler))
        .route("/api/analysis", get(api::analysis_handler))
        .route("/health", get(api::health_handler))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let app_config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("stock_analyzer_server=info,stock_analyzer=info")),
        )
        .with_target(false)
        .init();

    // Set a global span with the service name for all subsequent logs
    let _span = tracing::info_span!("service", name = %app_config.service_name).entered();

    tracing::info!("Starting stock-analyzer-server");
    tracing::info!(
        environment = %app_config.environment,
        port = app_config.port,
        market_timezone = %app_config.market_timezone,
        cache_capacity = app_config.cache_capacity,
        "Loaded configuration"
    );

    let analyzer = AnalyzerBuilder::yahoo(app_config.yahoo_config())?
        .with_cache_config(app_config.cache_config())
        .build()?;

    let app_state = AppState {
        analyzer: Arc::new(analyzer),
        config: Arc::new(app_config.clone()),
    };

    let mut app = build_router(app_state);

    if app_config.rate_limit.enabled {
        let governor_conf = Arc::new(
            GovernorConfigBuilder::default()
                .per_second(app_config.rate_limit.replenish_secs)
                .burst_size(app_config.rate_limit.burst)
                .finish()
                .ok_or("invalid rate limit configuration")?,
        );
        tracing::info!(
            replenish_secs = app_config.rate_limit.replenish_secs,
            burst = app_config.rate_limit.burst,
            "Inbound rate limiting enabled"
        );
        app = app.layer(GovernorLayer::new(governor_conf));
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], app_config.port));
    tracing::info!(%addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

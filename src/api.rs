use crate::data_structures::{DashboardParams, FormValues, HealthResponse, SharedAnalyzer, SharedConfig};
use crate::render::render_page;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{Html, IntoResponse},
};
use axum_extra::extract::Query;
use chrono::NaiveDate;
use stock_analyzer::error::FetchErrorKind;
use stock_analyzer::models::RenderModel;
use stock_analyzer::utils::date::format_date;
use tracing::{debug, info, instrument};

/// One interaction: turn the widget values into a render model
async fn run_pipeline(
    analyzer: &SharedAnalyzer,
    config: &SharedConfig,
    params: &DashboardParams,
    today: NaiveDate,
) -> (FormValues, RenderModel) {
    match params.to_input(config, today) {
        Ok(input) => {
            let model = analyzer.analyze(&input, today).await;
            (FormValues::from_input(&input, today), model)
        }
        Err(e) => (
            FormValues::from_params(params, today),
            RenderModel::Rejected { message: e.to_string() },
        ),
    }
}

fn status_for(model: &RenderModel) -> StatusCode {
    match model {
        RenderModel::Rejected { .. } => StatusCode::BAD_REQUEST,
        RenderModel::Failed { kind: FetchErrorKind::Timeout, .. } => StatusCode::GATEWAY_TIMEOUT,
        RenderModel::Failed { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::OK,
    }
}

#[instrument(skip(analyzer, config), fields(symbol = %params.symbol.as_deref().unwrap_or("default")))]
pub async fn dashboard_handler(
    State(analyzer): State<SharedAnalyzer>,
    State(config): State<SharedConfig>,
    Query(params): Query<DashboardParams>,
) -> impl IntoResponse {
    debug!("Received dashboard request");

    let today = config.market_today();
    let (form, model) = run_pipeline(&analyzer, &config, &params, today).await;

    info!(status = model.status(), "Rendered dashboard");
    // the page shows failures inline, so it is always served as a page
    Html(render_page(&config.service_name, &form, &model))
}

#[instrument(skip(analyzer, config), fields(symbol = %params.symbol.as_deref().unwrap_or("default")))]
pub async fn analysis_handler(
    State(analyzer): State<SharedAnalyzer>,
    State(config): State<SharedConfig>,
    Query(params): Query<DashboardParams>,
) -> impl IntoResponse {
    debug!("Received analysis request");

    let today = config.market_today();
    let (_, model) = run_pipeline(&analyzer, &config, &params, today).await;
    let status = status_for(&model);

    info!(status = model.status(), http_status = status.as_u16(), "Returning analysis");
    (status, Json(model))
}

#[instrument(skip(analyzer, config))]
pub async fn health_handler(
    State(analyzer): State<SharedAnalyzer>,
    State(config): State<SharedConfig>,
) -> impl IntoResponse {
    let cache = analyzer.cache_stats().await;
    debug!(entries = cache.entries, hits = cache.hits, misses = cache.misses, "Health check");

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            service: config.service_name.clone(),
            environment: config.environment.clone(),
            provider: analyzer.provider_name(),
            market_date: format_date(config.market_today()),
            cache,
        }),
    )
}

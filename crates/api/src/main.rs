use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use sicuan_core::advisor::{market_rows, Advisor};
use sicuan_core::config::AdvisoryConfig;
use sicuan_core::domain::advisory::{AdvisoryRequest, AdvisoryResult};
use sicuan_core::error::AdvisoryError;
use sicuan_core::market::feed::{HttpJsonMarketFeed, MarketFeed, StaticMarketFeed};
use sicuan_core::market::signal::MarketRow;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = sicuan_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let config = settings.load_advisory_config()?;
    let advisor = Advisor::new(config)?;

    let feed: Arc<dyn MarketFeed> = match HttpJsonMarketFeed::from_settings(&settings) {
        Ok(feed) => Arc::new(feed),
        Err(e) => {
            tracing::warn!(error = %e, "market feed not configured; serving advisories without market data");
            Arc::new(StaticMarketFeed::default())
        }
    };

    let state = AppState {
        advisor: Arc::new(advisor),
        feed,
    };

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/universe", get(get_universe))
        .route("/market", get(get_market))
        .route("/advisories", post(create_advisory))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    advisor: Arc<Advisor>,
    feed: Arc<dyn MarketFeed>,
}

#[derive(Debug, Serialize)]
struct ApiAdvisory {
    advisory_id: Uuid,
    generated_at: DateTime<Utc>,
    result: AdvisoryResult,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

async fn get_universe(State(state): State<AppState>) -> Json<AdvisoryConfig> {
    Json(state.advisor.config().clone())
}

async fn get_market(State(state): State<AppState>) -> Json<Vec<MarketRow>> {
    Json(market_rows(state.feed.as_ref()).await)
}

async fn create_advisory(
    State(state): State<AppState>,
    Json(request): Json<AdvisoryRequest>,
) -> Result<Json<ApiAdvisory>, (StatusCode, Json<ApiError>)> {
    let result = state
        .advisor
        .advise_with_feed(&request, state.feed.as_ref())
        .await
        .map_err(|e| {
            let status = status_for(&e);
            if status != StatusCode::BAD_REQUEST {
                sentry_anyhow::capture_anyhow(&anyhow::Error::new(e.clone()));
                tracing::error!(error = %e, "advisory failed");
            }
            (status, Json(ApiError { error: e.to_string() }))
        })?;

    let advisory_id = Uuid::new_v4();
    tracing::info!(
        %advisory_id,
        tier = %result.tier,
        feasible = result.is_feasible(),
        "advisory served"
    );

    Ok(Json(ApiAdvisory {
        advisory_id,
        generated_at: Utc::now(),
        result,
    }))
}

fn status_for(err: &AdvisoryError) -> StatusCode {
    match err {
        AdvisoryError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        AdvisoryError::NumericalFailure { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AdvisoryError::ExternalDataUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &sicuan_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_error_taxonomy_to_status_codes() {
        assert_eq!(
            status_for(&AdvisoryError::invalid("horizon", "zero")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&AdvisoryError::numerical("cholesky", "singular")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&AdvisoryError::unavailable("http_json", "down")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn create_advisory_returns_result_envelope() {
        let state = AppState {
            advisor: Arc::new(Advisor::new(AdvisoryConfig::default()).unwrap()),
            feed: Arc::new(StaticMarketFeed::default()),
        };
        let request: AdvisoryRequest = serde_json::from_value(serde_json::json!({
            "answers": [3, 3, 3, 3, 3, 2, 2, 2],
            "initial_capital": 10_000_000,
            "target_amount": 50_000_000,
            "horizon": {"value": 5, "unit": "years"}
        }))
        .unwrap();

        let Json(body) = create_advisory(State(state.clone()), Json(request.clone()))
            .await
            .unwrap();
        assert_eq!(body.result.required_monthly_contribution(), 666_666);

        let mut bad = request;
        bad.answers = vec![9; 8];
        let (status, Json(err)) = create_advisory(State(state), Json(bad)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err.error.contains("answers"));
    }
}

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use serde::Deserialize;
use shared::{
    domain::Side,
    error::{ApiError, ErrorCode},
    protocol::{DeviceResultPayload, SamplesQuery},
};
use tokio::sync::Mutex;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod acquisition;
mod config;

use acquisition::{Acquisition, AcquisitionError};
use config::load_settings;

const MAX_BODY_BYTES: usize = 256 * 1024;

/// HTTP stand-in for the bicep EMG band.
#[derive(Parser, Debug)]
struct Args {
    /// Overrides `bind_addr` from settings.
    #[arg(long)]
    bind: Option<String>,
}

struct AppState {
    acquisition: Mutex<Acquisition>,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[derive(Debug, Deserialize)]
struct StartParams {
    side: String,
    #[serde(rename = "userId", default)]
    user_id: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let mut settings = load_settings();
    if let Some(bind) = args.bind {
        settings.bind_addr = bind;
    }

    let state = AppState {
        acquisition: Mutex::new(Acquisition::new(settings.max_samples_per_window)),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "device simulator listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/start", get(start))
        .route("/samples", post(samples))
        .route("/stop", get(stop))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StartParams>,
) -> ApiResult<String> {
    let side: Side = params.side.parse().map_err(|e: shared::error::ParseSideError| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(ErrorCode::Validation, e.to_string())),
        )
    })?;
    let user_id = params.user_id.unwrap_or_else(|| "anonymous".to_string());

    if let Some(replaced) = state.acquisition.lock().await.open(side) {
        warn!(%replaced, %side, "replacing an open acquisition window");
    }
    info!(%side, %user_id, "acquisition window opened");
    Ok(format!("started {side} for {user_id}"))
}

async fn samples(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SamplesQuery>,
    Json(readings): Json<Vec<f64>>,
) -> ApiResult<Json<serde_json::Value>> {
    let buffered = state
        .acquisition
        .lock()
        .await
        .push(query.side, &readings)
        .map_err(acquisition_error)?;
    Ok(Json(serde_json::json!({ "buffered": buffered })))
}

async fn stop(State(state): State<Arc<AppState>>) -> ApiResult<Json<DeviceResultPayload>> {
    let payload = state
        .acquisition
        .lock()
        .await
        .close()
        .map_err(acquisition_error)?;
    info!(?payload, "acquisition window closed");
    Ok(Json(payload))
}

fn acquisition_error(err: AcquisitionError) -> (StatusCode, Json<ApiError>) {
    let (status, code) = match err {
        AcquisitionError::NoOpenWindow => (StatusCode::CONFLICT, ErrorCode::Conflict),
        _ => (StatusCode::BAD_REQUEST, ErrorCode::Validation),
    };
    (status, Json(ApiError::new(code, err.to_string())))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

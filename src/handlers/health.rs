use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use serde_json::json;
use std::sync::OnceLock;
use std::time::Instant;

use crate::AppState;

/// Tracks application start time for uptime calculation
static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Initialize the start time (call this on application startup)
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

fn get_uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

#[derive(Debug, Clone, Serialize)]
pub struct SapTarget {
    pub host: String,
    pub client: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub commit: &'static str,
    pub built: &'static str,
    pub environment: String,
    pub timestamp: String,
    pub uptime_secs: u64,
    pub operations: usize,
    pub sap: SapTarget,
}

/// Liveness probe: the process is up
async fn liveness_check() -> impl IntoResponse {
    Json(json!({
        "status": "up",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Service status and the SAP system it forwards to; SAP itself is not contacted.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let host = url::Url::parse(&state.config.sap.base_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_default();

    Json(HealthResponse {
        status: "up",
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_HASH").unwrap_or("unknown"),
        built: option_env!("BUILD_TIME").unwrap_or("unknown"),
        environment: state.config.environment.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_secs: get_uptime_secs(),
        operations: crate::portals::catalog().count(),
        sap: SapTarget {
            host,
            client: state.config.sap.client.clone(),
            timeout_secs: state.config.sap.timeout_secs,
        },
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness_check))
}

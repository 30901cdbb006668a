use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{acquire::Acquirer, store::Store};

/// Widest history window the API admits; beyond 168 h the store serves
/// hourly buckets, so this is bounded by retention rather than resolution.
const MAX_HISTORY_HOURS: i64 = 720;
const MAX_EVENT_DAYS: i64 = 7;
const MAX_STATS_DAYS: i64 = 30;

/// A reading newer than this means the collector is writing.
const RECENT_DATA_SECS: i64 = 120;

#[derive(Clone)]
pub struct ApiState {
    pub store: Store,
    pub acquirer: Arc<Acquirer>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/status", get(live_status))
        .route("/api/history", get(history))
        .route("/api/events", get(events))
        .route("/api/events/acknowledge", post(acknowledge))
        .route("/api/power_stats", get(power_stats))
        .route("/api/health", get(health))
        .with_state(state)
}

/// Transport internals stay in the server logs; responses carry only a flat
/// error message.
fn error_response(code: StatusCode, message: &str) -> Response {
    (code, Json(json!({ "error": message }))).into_response()
}

#[derive(Deserialize)]
struct HistoryParams {
    hours: Option<i64>,
}

#[derive(Deserialize)]
struct DaysParams {
    days: Option<i64>,
}

/// Live snapshot straight from the acquisition layer; unlike the collector,
/// this path never appends.
async fn live_status(State(state): State<ApiState>) -> Response {
    match state.acquirer.acquire().await {
        Ok(status) => Json(status).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "live status unavailable");
            error_response(StatusCode::SERVICE_UNAVAILABLE, "Failed to get UPS status")
        }
    }
}

async fn history(State(state): State<ApiState>, Query(params): Query<HistoryParams>) -> Response {
    let hours = params.hours.unwrap_or(24).clamp(1, MAX_HISTORY_HOURS);
    match state.store.history(hours).await {
        Ok(readings) => Json(readings).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "error getting history");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get history")
        }
    }
}

async fn events(State(state): State<ApiState>, Query(params): Query<DaysParams>) -> Response {
    let days = params.days.unwrap_or(7).clamp(1, MAX_EVENT_DAYS);
    match state.store.events(days).await {
        Ok(events) => Json(events).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "error getting events");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get events")
        }
    }
}

async fn acknowledge(State(state): State<ApiState>) -> Response {
    match state.store.acknowledge_all().await {
        Ok(count) => Json(json!({ "acknowledged": count })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "error acknowledging events");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to acknowledge events",
            )
        }
    }
}

async fn power_stats(State(state): State<ApiState>, Query(params): Query<DaysParams>) -> Response {
    let days = params.days.unwrap_or(7).clamp(1, MAX_STATS_DAYS);
    match state.store.statistics(days).await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "error getting power statistics");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to get power statistics",
            )
        }
    }
}

/// Tri-state health: the UPS must answer a live poll and the collector must
/// have written recently for "healthy"; one of the two is "warning"; neither
/// is "unhealthy" and 503.
async fn health(State(state): State<ApiState>) -> Response {
    let live = state.acquirer.acquire().await.is_ok();

    let recent = match state.store.latest_reading_age().await {
        Ok(Some(age)) => age <= time::Duration::seconds(RECENT_DATA_SECS),
        Ok(None) => false,
        Err(e) => {
            tracing::error!(error = %e, "error checking latest reading");
            false
        }
    };

    let (code, verdict) = match (live, recent) {
        (true, true) => (StatusCode::OK, "healthy"),
        (false, false) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
        _ => (StatusCode::OK, "warning"),
    };

    (
        code,
        Json(json!({
            "status": verdict,
            "ups_reachable": live,
            "recent_data": recent,
        })),
    )
        .into_response()
}

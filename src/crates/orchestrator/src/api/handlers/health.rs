//! Health endpoint handler

use crate::api::models::HealthResponse;
use crate::api::routes::AppState;
use axum::{extract::State, Json};
use std::collections::BTreeMap;

fn status(configured: bool) -> &'static str {
    if configured {
        "configured"
    } else {
        "needs_configuration"
    }
}

/// Liveness plus backend configuration status
///
/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut backends: BTreeMap<String, String> = state
        .tools
        .health()
        .into_iter()
        .map(|(name, tool_status)| (name.to_string(), tool_status.to_string()))
        .collect();

    backends.insert(
        "llm".to_string(),
        status(state.llm.is_available().await).to_string(),
    );
    backends.insert(
        "broker".to_string(),
        status(state.broker.is_available()).to_string(),
    );
    backends.insert(
        "store".to_string(),
        status(state.sessions.is_available().await).to_string(),
    );

    Json(HealthResponse {
        status: "healthy".to_string(),
        backends,
        queue_depth: state.broker.queue.depth(),
        active_streams: state.broker.events.channel_count(),
    })
}

//! Job enqueue handler

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::{QueueRequest, QueueResponse};
use crate::api::routes::AppState;
use crate::broker::Job;
use axum::{extract::State, Json};
use uuid::Uuid;

/// Enqueue a query for asynchronous processing
///
/// POST /api/queue
pub async fn enqueue(
    State(state): State<AppState>,
    Json(request): Json<QueueRequest>,
) -> ApiResult<Json<QueueResponse>> {
    if request.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }
    if request.session_id.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "session_id must not be empty".to_string(),
        ));
    }

    let request_id = Uuid::new_v4().to_string();
    let mut job = Job::new(&request_id, request.session_id.trim(), request.query.trim());
    job.target_language = request.target_language;
    job.model = request.model;

    // Open the event channel before the job is visible to workers so the
    // `connected` event can never race an unopened channel.
    state.broker.events.open(&request_id);
    state.broker.queue.enqueue(job)?;

    tracing::info!(%request_id, "Enqueued job");
    Ok(Json(QueueResponse {
        success: true,
        stream_url: format!("/api/stream/{}", request_id),
        request_id,
    }))
}

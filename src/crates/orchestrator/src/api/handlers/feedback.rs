//! Feedback endpoint handlers

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::{AnalyticsQuery, AnalyticsResponse, FeedbackRequest, FeedbackResponse};
use crate::api::routes::AppState;
use crate::feedback::{self, FeedbackFilter};
use axum::{
    extract::{Query, State},
    Json,
};

/// Append a feedback record
///
/// POST /api/feedback
pub async fn create_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> ApiResult<Json<FeedbackResponse>> {
    if request.session_id.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "session_id must not be empty".to_string(),
        ));
    }

    let record = feedback::new_record(
        request.session_id,
        request.message_index,
        request.feedback_type,
        request.user_query,
        request.assistant_response,
        request.routing_decision,
        request.intent,
        request.model_used,
    );
    let feedback_id = state.feedback.append(record).await;

    tracing::info!(%feedback_id, "Stored feedback");
    Ok(Json(FeedbackResponse {
        success: true,
        feedback_id,
    }))
}

/// Aggregate feedback counters
///
/// GET /api/analytics/feedback
pub async fn feedback_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<Json<AnalyticsResponse>> {
    let filter = FeedbackFilter {
        start_date: query.start_date,
        routing_decision: query.routing_decision,
    };
    let analytics = feedback::aggregate(state.feedback.as_ref(), &filter).await;

    Ok(Json(AnalyticsResponse {
        success: true,
        analytics,
    }))
}

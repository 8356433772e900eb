//! Request and response bodies for the API

use crate::feedback::{FeedbackAnalytics, FeedbackType};
use chrono::{DateTime, Utc};
use relay_core::{Message, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// POST /api/queue request
///
/// `query` and `session_id` default to empty so a missing field surfaces as
/// a validation 400 rather than a body-rejection status.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueRequest {
    /// User query text
    #[serde(default)]
    pub query: String,
    /// Session the query belongs to
    #[serde(default)]
    pub session_id: String,
    /// Answer language override
    #[serde(default)]
    pub target_language: Option<String>,
    /// Model override
    #[serde(default)]
    pub model: Option<String>,
}

/// POST /api/queue response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueResponse {
    /// Always true on success
    pub success: bool,
    /// Identifier for following the run
    pub request_id: String,
    /// SSE stream URL for this request
    pub stream_url: String,
}

/// Query parameters for GET /api/sessions
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListSessionsQuery {
    /// Only sessions updated after this instant (RFC 3339)
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    /// Maximum sessions to return
    #[serde(default)]
    pub limit: Option<usize>,
}

/// One session in a listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier
    pub session_id: String,
    /// Truncated rolling summary
    pub summary: String,
    /// Timestamp of the last update
    pub last_updated: DateTime<Utc>,
}

/// GET /api/sessions response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSessionsResponse {
    /// Always true on success
    pub success: bool,
    /// Sessions, newest first
    pub sessions: Vec<SessionSummary>,
}

/// One history entry as served to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Message author
    pub role: Role,
    /// Message text
    pub content: String,
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// GET /api/sessions/{id} response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Always true on success
    pub success: bool,
    /// Conversation history, oldest first
    pub history: Vec<HistoryEntry>,
    /// Rolling summary
    pub summary: String,
}

/// DELETE /api/sessions/{id} response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteSessionResponse {
    /// Always true (the delete is idempotent)
    pub success: bool,
    /// Confirmation message
    pub message: String,
}

/// POST /api/feedback request
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequest {
    /// Session the feedback belongs to
    pub session_id: String,
    /// Position of the rated assistant message
    pub message_index: usize,
    /// Thumb direction
    pub feedback_type: FeedbackType,
    /// The query that produced the answer
    pub user_query: String,
    /// The answer being rated
    pub assistant_response: String,
    /// Tool chosen for the run
    #[serde(default)]
    pub routing_decision: Option<String>,
    /// Planner intent
    #[serde(default)]
    pub intent: Option<String>,
    /// Model that produced the answer
    #[serde(default)]
    pub model_used: Option<String>,
}

/// POST /api/feedback response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    /// Always true on success
    pub success: bool,
    /// Identifier of the stored record
    pub feedback_id: String,
}

/// Query parameters for GET /api/analytics/feedback
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsQuery {
    /// Only records created at or after this instant (RFC 3339)
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    /// Only records for this routing decision
    #[serde(default)]
    pub routing_decision: Option<String>,
}

/// GET /api/analytics/feedback response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    /// Always true on success
    pub success: bool,
    /// Aggregated counters
    #[serde(flatten)]
    pub analytics: FeedbackAnalytics,
}

/// GET /health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Backend configuration status by name
    pub backends: BTreeMap<String, String>,
    /// Jobs currently queued
    pub queue_depth: usize,
    /// Event channels currently held
    pub active_streams: usize,
}

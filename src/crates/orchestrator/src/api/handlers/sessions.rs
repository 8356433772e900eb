//! Session endpoint handlers

use crate::api::error::ApiResult;
use crate::api::models::{
    DeleteSessionResponse, HistoryEntry, ListSessionsQuery, ListSessionsResponse, SessionResponse,
    SessionSummary,
};
use crate::api::routes::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};

/// Default and maximum listing sizes
const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

/// List sessions, newest first
///
/// GET /api/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<ListSessionsQuery>,
) -> ApiResult<Json<ListSessionsResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let sessions = state.sessions.list_sessions(query.since, limit).await?;

    Ok(Json(ListSessionsResponse {
        success: true,
        sessions: sessions
            .into_iter()
            .map(|index| SessionSummary {
                session_id: index.session_id,
                summary: index.summary,
                last_updated: index.last_updated,
            })
            .collect(),
    }))
}

/// Fetch a session's history and summary
///
/// GET /api/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionResponse>> {
    let agent_state = state.sessions.get_state(&session_id).await?;

    let (history, summary) = match agent_state {
        Some(agent_state) => (
            agent_state.chat_history.iter().map(HistoryEntry::from).collect(),
            agent_state.summary,
        ),
        // Unknown sessions read as empty rather than missing: they are
        // created lazily on first enqueue.
        None => (Vec::new(), String::new()),
    };

    Ok(Json(SessionResponse {
        success: true,
        history,
        summary,
    }))
}

/// Clear a session
///
/// DELETE /api/sessions/{id} — idempotent, always 200
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<DeleteSessionResponse>> {
    state.sessions.delete_session(&session_id).await?;

    Ok(Json(DeleteSessionResponse {
        success: true,
        message: format!("session {} cleared", session_id),
    }))
}

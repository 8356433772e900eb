//! API route definitions

use crate::broker::Broker;
use crate::config::ServiceConfig;
use crate::feedback::FeedbackStore;
use crate::sessions::SessionService;
use axum::{
    routing::{get, post},
    Router,
};
use relay_agents::ToolRegistry;
use relay_core::llm::ChatModel;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Job queue and event channels
    pub broker: Arc<Broker>,
    /// Session persistence
    pub sessions: SessionService,
    /// Feedback persistence
    pub feedback: Arc<dyn FeedbackStore>,
    /// Tool backends, for health reporting
    pub tools: Arc<ToolRegistry>,
    /// Language model client, for health reporting
    pub llm: Arc<dyn ChatModel>,
    /// Service configuration
    pub config: Arc<ServiceConfig>,
}

/// Build the complete API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/queue", post(handlers::queue::enqueue))
        .route("/api/stream/:request_id", get(handlers::stream::stream))
        .route("/api/sessions", get(handlers::sessions::list_sessions))
        .route(
            "/api/sessions/:id",
            get(handlers::sessions::get_session).delete(handlers::sessions::delete_session),
        )
        .route("/api/feedback", post(handlers::feedback::create_feedback))
        .route(
            "/api/analytics/feedback",
            get(handlers::feedback::feedback_analytics),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

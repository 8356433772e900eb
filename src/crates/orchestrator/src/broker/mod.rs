//! Broker: job queue plus per-request event pub/sub
//!
//! A single shared broker instance carries both capabilities. The queue hands
//! each job to exactly one claimer (competing consumers); the event bus
//! broadcasts a request's events in publish order to every subscriber and
//! retains a bounded replay buffer so late subscribers still observe the
//! terminal event within the grace window.

pub mod pubsub;
pub mod queue;

pub use pubsub::{EventBus, EventEnvelope, Subscription};
pub use queue::JobQueue;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by broker operations
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The broker is shut down or unreachable
    #[error("broker unavailable")]
    Unavailable,

    /// No channel exists (or it was reaped) for the request
    #[error("unknown request_id: {0}")]
    UnknownRequest(String),

    /// The channel already received its terminal event
    #[error("event channel closed for request {0}")]
    ChannelClosed(String),

    /// Publishing kept failing after the bounded retry
    #[error("failed to publish after {attempts} attempts: {message}")]
    PublishFailed {
        /// Attempts made
        attempts: usize,
        /// Last failure
        message: String,
    },
}

/// A unit of work enqueued by the API and claimed by one worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Globally unique request identifier
    pub request_id: String,
    /// Session the query belongs to
    pub session_id: String,
    /// User query text
    pub query: String,
    /// Requested answer language, when overriding the session default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,
    /// Requested model, when overriding the configured default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Enqueue timestamp
    pub enqueued_at: DateTime<Utc>,
}

impl Job {
    /// Create a job timestamped now
    pub fn new(
        request_id: impl Into<String>,
        session_id: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            session_id: session_id.into(),
            query: query.into(),
            target_language: None,
            model: None,
            enqueued_at: Utc::now(),
        }
    }
}

/// The shared broker instance
pub struct Broker {
    /// FIFO job queue
    pub queue: JobQueue,
    /// Per-request event channels
    pub events: EventBus,
}

impl Broker {
    /// Create a broker with the given replay capacity and grace window
    pub fn new(replay_capacity: usize, sub_grace: Duration) -> Self {
        Self {
            queue: JobQueue::new(),
            events: EventBus::new(replay_capacity, sub_grace),
        }
    }

    /// Whether the broker accepts new work
    pub fn is_available(&self) -> bool {
        self.queue.is_open()
    }

    /// Spawn the background task that reaps expired event channels
    pub fn spawn_reaper(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let broker = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let reaped = broker.events.sweep();
                if reaped > 0 {
                    tracing::debug!(reaped, "Reaped expired event channels");
                }
            }
        })
    }
}

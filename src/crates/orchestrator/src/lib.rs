//! Relay orchestrator
//!
//! Ties the pipeline together: an in-process broker (FIFO job queue plus
//! per-request pub/sub with a replay buffer), a worker pool that runs the
//! agent graph, session and feedback persistence, and the HTTP/SSE API.
//!
//! Data flow: the API enqueues a [`broker::Job`]; a [`worker::Worker`] claims
//! it, loads prior session state, runs the graph while publishing events into
//! the broker, persists the checkpoint, and publishes the terminal event.
//! SSE subscribers follow a request by id and receive buffered plus live
//! events until the terminal one.

pub mod api;
pub mod broker;
pub mod config;
pub mod feedback;
pub mod sessions;
pub mod worker;

pub use broker::{Broker, BrokerError, EventEnvelope, Job};
pub use config::ServiceConfig;
pub use feedback::{FeedbackAnalytics, FeedbackRecord, FeedbackStore, InMemoryFeedbackStore};
pub use sessions::SessionService;
pub use worker::Worker;

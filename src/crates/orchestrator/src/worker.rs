//! Worker: claims jobs and runs the pipeline
//!
//! Each worker processes one job at a time. Nodes execute sequentially
//! within a job; parallelism comes from running multiple workers against the
//! shared broker. The worker owns the `connected` and terminal events so
//! that `complete` is only published once the final checkpoint landed.

use crate::broker::{Broker, Job};
use crate::sessions::SessionService;
use async_trait::async_trait;
use relay_core::{
    AgentState, CheckpointHook, CompletedState, EventSink, GraphError, GraphRunner, Message,
    NodeRegistry, PipelineEvent, Result as GraphResult, RunLimits,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Event sink that forwards runtime events into the broker
struct BusSink {
    broker: Arc<Broker>,
    request_id: String,
}

#[async_trait]
impl EventSink for BusSink {
    async fn emit(&self, event: PipelineEvent) -> GraphResult<()> {
        self.broker
            .events
            .publish(&self.request_id, event)
            .await
            .map_err(|e| GraphError::Channel(e.to_string()))
    }
}

/// Checkpoint hook persisting intermediate state after each node
///
/// Intermediate write failures are soft (the worker still writes the final
/// checkpoint); the terminal offer is skipped because the worker persists the
/// final state itself after appending the turn's messages.
struct WriteThroughHook {
    sessions: SessionService,
    session_id: String,
}

#[async_trait]
impl CheckpointHook for WriteThroughHook {
    async fn offer(&self, state: &AgentState, terminal: bool) {
        if terminal {
            return;
        }
        if let Err(e) = self.sessions.save_state(&self.session_id, state).await {
            tracing::warn!(
                session_id = %self.session_id,
                error = %e,
                "Intermediate checkpoint write failed"
            );
        }
    }
}

/// A single pipeline worker
pub struct Worker {
    id: usize,
    broker: Arc<Broker>,
    sessions: SessionService,
    registry: NodeRegistry,
    limits: RunLimits,
    claim_timeout: Duration,
}

impl Worker {
    /// Create a worker over a validated node registry
    pub fn new(
        id: usize,
        broker: Arc<Broker>,
        sessions: SessionService,
        registry: NodeRegistry,
        limits: RunLimits,
        claim_timeout: Duration,
    ) -> GraphResult<Self> {
        registry.validate()?;
        Ok(Self {
            id,
            broker,
            sessions,
            registry,
            limits,
            claim_timeout,
        })
    }

    /// Claim and process jobs until shutdown is signalled
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(worker = self.id, "Worker started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = shutdown.changed() => break,
                job = self.broker.queue.claim(self.claim_timeout) => {
                    if let Some(job) = job {
                        self.process(job).await;
                    }
                }
            }
        }
        tracing::info!(worker = self.id, "Worker stopped");
    }

    /// Run one claimed job to its terminal event
    pub async fn process(&self, job: Job) {
        let request_id = job.request_id.clone();
        tracing::info!(
            worker = self.id,
            %request_id,
            session_id = %job.session_id,
            "Processing job"
        );

        // The API opens the channel at enqueue time; opening again is a no-op
        // but keeps directly-injected jobs (tests, replays) working.
        self.broker.events.open(&request_id);
        self.publish(&request_id, PipelineEvent::Connected).await;

        let prior = match self.sessions.get_state(&job.session_id).await {
            Ok(prior) => prior,
            Err(e) => {
                tracing::error!(%request_id, error = %e, "Failed to load session state");
                self.publish(&request_id, PipelineEvent::error("load", e.to_string()))
                    .await;
                return;
            }
        };

        let state = self.initial_state(&job, prior);
        let sink = BusSink {
            broker: Arc::clone(&self.broker),
            request_id: request_id.clone(),
        };
        let hook = Arc::new(WriteThroughHook {
            sessions: self.sessions.clone(),
            session_id: job.session_id.clone(),
        });

        let runner = match GraphRunner::new(self.registry.clone(), self.limits.clone()) {
            Ok(runner) => runner.with_checkpoint_hook(hook),
            Err(e) => {
                self.publish(&request_id, PipelineEvent::error(e.stage(), e.to_string()))
                    .await;
                return;
            }
        };

        match runner.run(state, &sink).await {
            Ok(mut final_state) => {
                let answer = final_state.final_answer.clone().unwrap_or_default();
                final_state.chat_history.push(Message::user(&final_state.query));
                final_state.chat_history.push(Message::assistant(answer));

                match self.sessions.save_state(&job.session_id, &final_state).await {
                    Ok(sequence) => {
                        tracing::info!(%request_id, sequence, "Run complete");
                        self.publish(
                            &request_id,
                            PipelineEvent::Complete {
                                state: CompletedState::from_state(&final_state),
                            },
                        )
                        .await;
                    }
                    Err(e) => {
                        tracing::error!(%request_id, error = %e, "Final checkpoint write failed");
                        self.publish(&request_id, PipelineEvent::error("persist", e.to_string()))
                            .await;
                    }
                }
            }
            Err(e) => {
                // Any state gathered before the failure was already persisted
                // by the write-through hook; the session history is untouched.
                tracing::error!(%request_id, stage = e.stage(), error = %e, "Run failed");
                self.publish(&request_id, PipelineEvent::error(e.stage(), e.to_string()))
                    .await;
            }
        }
    }

    fn initial_state(&self, job: &Job, prior: Option<AgentState>) -> AgentState {
        let session_language = prior
            .as_ref()
            .map(|state| state.target_language.clone())
            .unwrap_or_else(|| self.limits.base_language.clone());
        let target_language = job
            .target_language
            .clone()
            .unwrap_or(session_language);

        let mut state = AgentState::new(&job.query, target_language);
        if let Some(prior) = prior {
            state = state.with_history(prior.chat_history, prior.summary);
        }
        state
    }

    async fn publish(&self, request_id: &str, event: PipelineEvent) {
        if let Err(e) = self.broker.events.publish(request_id, event).await {
            tracing::warn!(%request_id, error = %e, "Failed to publish event");
        }
    }
}

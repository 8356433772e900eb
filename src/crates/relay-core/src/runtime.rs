//! Graph executor
//!
//! Drives the fixed state machine from `router` to `finalize`, merging node
//! deltas into the run state, emitting events on every transition and
//! offering the state to a checkpoint hook after each node exit.
//!
//! Budget enforcement lives here: a per-node timeout (with a larger allowance
//! for retrieval and generation), a bounded per-node retry for retryable
//! failures, a whole-job deadline, and the revision-loop cap. Spending a
//! budget is not an error: like the revision cap, an exhausted job deadline
//! closes the run out with the last draft answer (or the no-answer stub) so
//! the run still completes.

use crate::error::{GraphError, Result};
use crate::event::PipelineEvent;
use crate::graph::{next_node, NodeKind};
use crate::node::NodeRegistry;
use crate::state::{AgentState, StateDelta, Verdict};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Answer shown when the critic rejects a draft for safety or policy reasons
const REJECTION_NOTICE: &str =
    "I can't help with that request. If you believe this is a mistake, please rephrase your question.";

/// Answer published when a run ends without ever producing a draft
pub const NO_ANSWER_STUB: &str =
    "I'm sorry, I wasn't able to produce an answer this time. Please try asking again.";

/// Execution budgets for one run
#[derive(Debug, Clone)]
pub struct RunLimits {
    /// Cap on generator re-runs driven by the critic
    pub max_revisions: u32,
    /// Language answers are drafted in; the translator is bypassed for it
    pub base_language: String,
    /// Default per-node timeout
    pub node_timeout: Duration,
    /// Timeout for the retrieval node
    pub retrieval_timeout: Duration,
    /// Timeout for the generator node
    pub generator_timeout: Duration,
    /// Whole-job deadline
    pub job_deadline: Duration,
    /// Attempts per node (including the first) for retryable failures
    pub node_attempts: usize,
    /// Base backoff between node retry attempts
    pub retry_backoff: Duration,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            max_revisions: 2,
            base_language: "en".to_string(),
            node_timeout: Duration::from_secs(60),
            retrieval_timeout: Duration::from_secs(120),
            generator_timeout: Duration::from_secs(180),
            job_deadline: Duration::from_secs(600),
            node_attempts: 2,
            retry_backoff: Duration::from_millis(200),
        }
    }
}

impl RunLimits {
    /// Timeout applying to the given node
    pub fn timeout_for(&self, node: NodeKind) -> Duration {
        match node {
            NodeKind::Retrieval => self.retrieval_timeout,
            NodeKind::Generator => self.generator_timeout,
            _ => self.node_timeout,
        }
    }
}

/// Destination for run events
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one event; an error aborts the run
    async fn emit(&self, event: PipelineEvent) -> Result<()>;
}

/// Event sink backed by a tokio mpsc channel
pub struct ChannelSink {
    tx: mpsc::Sender<PipelineEvent>,
}

impl ChannelSink {
    /// Create a sink and its receiving half
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<PipelineEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn emit(&self, event: PipelineEvent) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|e| GraphError::Channel(e.to_string()))
    }
}

/// Receives the state after each node exit
///
/// Writes are the hook's responsibility; the runtime guarantees at most one
/// offer per node plus one terminal offer.
#[async_trait]
pub trait CheckpointHook: Send + Sync {
    /// Offer the current state; `terminal` is true for the final offer
    async fn offer(&self, state: &AgentState, terminal: bool);
}

/// Hook that discards every offer
pub struct NoopCheckpointHook;

#[async_trait]
impl CheckpointHook for NoopCheckpointHook {
    async fn offer(&self, _state: &AgentState, _terminal: bool) {}
}

/// Executor for the pipeline state machine
pub struct GraphRunner {
    registry: NodeRegistry,
    limits: RunLimits,
    hook: Arc<dyn CheckpointHook>,
}

impl GraphRunner {
    /// Create a runner over a validated node registry
    pub fn new(registry: NodeRegistry, limits: RunLimits) -> Result<Self> {
        registry.validate()?;
        Ok(Self {
            registry,
            limits,
            hook: Arc::new(NoopCheckpointHook),
        })
    }

    /// Attach a checkpoint hook
    pub fn with_checkpoint_hook(mut self, hook: Arc<dyn CheckpointHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Execution budgets in effect
    pub fn limits(&self) -> &RunLimits {
        &self.limits
    }

    /// Run the graph to its terminal node
    ///
    /// Emits `node` and `state_delta` events through `sink`; the caller owns
    /// `connected` and the terminal `complete`/`error` so that persistence
    /// outcomes can gate the terminal event.
    pub async fn run(&self, mut state: AgentState, sink: &dyn EventSink) -> Result<AgentState> {
        let started = Instant::now();
        let mut current = NodeKind::Router;

        loop {
            sink.emit(PipelineEvent::Node { node: current }).await?;

            let delta = match self.run_node(current, &state, started).await {
                Ok(delta) => delta,
                Err(GraphError::DeadlineExceeded { deadline }) => {
                    return self.close_out(state, current, deadline, sink).await;
                }
                Err(e) => return Err(e),
            };
            let announce = !delta.is_empty();
            state.apply(delta.clone());
            if announce {
                sink.emit(PipelineEvent::StateDelta {
                    node: current,
                    delta,
                })
                .await?;
            }

            if current == NodeKind::Critic {
                self.settle_critique(&mut state);
            }

            let next = next_node(
                current,
                &state,
                self.limits.max_revisions,
                &self.limits.base_language,
            );
            self.hook.offer(&state, next.is_none()).await;

            match next {
                Some(next) => {
                    if current == NodeKind::Critic && next == NodeKind::Generator {
                        state.revision_count += 1;
                        tracing::debug!(
                            revision = state.revision_count,
                            "Critic requested revision"
                        );
                    }
                    current = next;
                }
                None => break,
            }
        }

        Ok(state)
    }

    /// Terminate an over-deadline run with the best answer available
    ///
    /// The time budget is spent, so no further nodes execute: the last draft
    /// (or the no-answer stub) becomes the final answer and the run
    /// completes, same as when the revision cap forces the loop to exit.
    async fn close_out(
        &self,
        mut state: AgentState,
        node: NodeKind,
        deadline: Duration,
        sink: &dyn EventSink,
    ) -> Result<AgentState> {
        tracing::warn!(
            node = node.as_str(),
            "Job deadline reached; closing out the run"
        );

        let answer = state
            .draft_answer
            .clone()
            .unwrap_or_else(|| NO_ANSWER_STUB.to_string());
        let delta = StateDelta::new()
            .with_final_answer(answer)
            .with_warning(format!("job deadline of {:?} exceeded at {}", deadline, node));
        state.apply(delta.clone());
        sink.emit(PipelineEvent::StateDelta { node, delta }).await?;

        self.hook.offer(&state, true).await;
        Ok(state)
    }

    /// Replace a rejected draft with the sanitized notice
    ///
    /// Rejection is terminal for the content but not for the run: the graph
    /// still proceeds through translator/summarize/finalize and completes.
    fn settle_critique(&self, state: &mut AgentState) {
        let rejected = state
            .critique
            .as_ref()
            .map(|c| c.verdict == Verdict::Rejected)
            .unwrap_or(false);
        if rejected {
            tracing::warn!("Critic rejected the draft; sanitizing answer");
            state.draft_answer = Some(REJECTION_NOTICE.to_string());
            state.citations.clear();
        }
    }

    /// Execute one node with timeout and bounded retry
    async fn run_node(
        &self,
        kind: NodeKind,
        state: &AgentState,
        started: Instant,
    ) -> Result<StateDelta> {
        let node = self
            .registry
            .get(kind)
            .ok_or(GraphError::MissingNode(kind))?;
        let node_timeout = self.limits.timeout_for(kind);
        let mut attempts = 0;

        loop {
            attempts += 1;

            let remaining = self.limits.job_deadline.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return Err(GraphError::DeadlineExceeded {
                    deadline: self.limits.job_deadline,
                });
            }
            let effective = node_timeout.min(remaining);

            let error = match tokio::time::timeout(effective, node.run(state)).await {
                Ok(Ok(delta)) => return Ok(delta),
                Ok(Err(e)) => e,
                Err(_) if effective < node_timeout => {
                    // The job deadline expired mid-node; this is not retryable.
                    return Err(GraphError::DeadlineExceeded {
                        deadline: self.limits.job_deadline,
                    });
                }
                Err(_) => GraphError::NodeTimeout {
                    node: kind,
                    timeout: node_timeout,
                },
            };

            if error.is_retryable() && attempts < self.limits.node_attempts {
                tracing::warn!(
                    node = kind.as_str(),
                    attempt = attempts,
                    error = %error,
                    "Node failed, retrying"
                );
                tokio::time::sleep(self.limits.retry_backoff * attempts as u32).await;
                continue;
            }

            return Err(error);
        }
    }
}

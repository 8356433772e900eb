//! Per-request event channels with replay
//!
//! Each request gets its own broadcast channel plus a bounded replay buffer
//! of the most recent events. Subscribing snapshots the buffer and attaches
//! to the live feed under one lock, so subscribers observe every event in
//! publish order with no gap between backlog and live delivery. Channels
//! that received their terminal event are kept for a grace window and then
//! reaped; subscribing after the reap fails with `UnknownRequest`.

use super::BrokerError;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use relay_core::PipelineEvent;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

/// Broadcast channel capacity per request
const CHANNEL_CAPACITY: usize = 256;

/// Publish retry policy: attempts and backoff between them
const PUBLISH_ATTEMPTS: usize = 3;
const PUBLISH_BACKOFF: Duration = Duration::from_millis(50);

/// An event as carried on a request's channel
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    /// Request the event belongs to
    pub request_id: String,
    /// Position in the request's event order
    pub sequence: u64,
    /// The event itself
    pub event: PipelineEvent,
    /// Publish timestamp
    pub published_at: DateTime<Utc>,
}

struct Channel {
    tx: broadcast::Sender<EventEnvelope>,
    replay: VecDeque<EventEnvelope>,
    next_sequence: u64,
    terminal: bool,
    closed_at: Option<Instant>,
}

impl Channel {
    fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            replay: VecDeque::new(),
            next_sequence: 0,
            terminal: false,
            closed_at: None,
        }
    }
}

/// What a subscriber receives: the buffered past plus the live feed
pub struct Subscription {
    /// Events published before the subscription, in order
    pub backlog: Vec<EventEnvelope>,
    /// Live receiver; `None` when the request already terminated
    pub live: Option<broadcast::Receiver<EventEnvelope>>,
}

/// Per-request pub/sub with bounded replay
pub struct EventBus {
    channels: RwLock<HashMap<String, Channel>>,
    replay_capacity: usize,
    sub_grace: Duration,
}

impl EventBus {
    /// Create a bus with the given replay capacity and grace window
    pub fn new(replay_capacity: usize, sub_grace: Duration) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            replay_capacity,
            sub_grace,
        }
    }

    /// Create the channel for a request; idempotent
    pub fn open(&self, request_id: &str) {
        let mut channels = self.channels.write();
        channels
            .entry(request_id.to_string())
            .or_insert_with(Channel::new);
    }

    /// Channels currently held (live and in-grace)
    pub fn channel_count(&self) -> usize {
        self.channels.read().len()
    }

    /// Publish an event to a request's channel
    ///
    /// Best-effort with a bounded retry while the channel is missing (the
    /// subscriber side may still be opening it). Publishing after the
    /// terminal event is an error.
    pub async fn publish(
        &self,
        request_id: &str,
        event: PipelineEvent,
    ) -> Result<(), BrokerError> {
        let mut last_error = None;
        for attempt in 0..PUBLISH_ATTEMPTS {
            match self.try_publish(request_id, &event) {
                Ok(()) => return Ok(()),
                Err(e @ BrokerError::ChannelClosed(_)) => return Err(e),
                Err(e) => last_error = Some(e),
            }
            if attempt + 1 < PUBLISH_ATTEMPTS {
                tokio::time::sleep(PUBLISH_BACKOFF).await;
            }
        }
        Err(BrokerError::PublishFailed {
            attempts: PUBLISH_ATTEMPTS,
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    fn try_publish(&self, request_id: &str, event: &PipelineEvent) -> Result<(), BrokerError> {
        let mut channels = self.channels.write();
        let channel = channels
            .get_mut(request_id)
            .ok_or_else(|| BrokerError::UnknownRequest(request_id.to_string()))?;

        if channel.terminal {
            return Err(BrokerError::ChannelClosed(request_id.to_string()));
        }

        let envelope = EventEnvelope {
            request_id: request_id.to_string(),
            sequence: channel.next_sequence,
            event: event.clone(),
            published_at: Utc::now(),
        };
        channel.next_sequence += 1;

        if channel.replay.len() >= self.replay_capacity {
            channel.replay.pop_front();
        }
        channel.replay.push_back(envelope.clone());

        if envelope.event.is_terminal() {
            channel.terminal = true;
            channel.closed_at = Some(Instant::now());
        }

        // No receivers is fine; the replay buffer covers late subscribers.
        let _ = channel.tx.send(envelope);
        Ok(())
    }

    /// Subscribe to a request's events
    ///
    /// The backlog and the live receiver are taken under one lock, so the
    /// caller sees every event exactly once, in order.
    pub fn subscribe(&self, request_id: &str) -> Result<Subscription, BrokerError> {
        let channels = self.channels.read();
        let channel = channels
            .get(request_id)
            .ok_or_else(|| BrokerError::UnknownRequest(request_id.to_string()))?;

        let backlog: Vec<EventEnvelope> = channel.replay.iter().cloned().collect();
        let live = if channel.terminal {
            None
        } else {
            Some(channel.tx.subscribe())
        };
        Ok(Subscription { backlog, live })
    }

    /// Drop terminal channels older than the grace window; returns the count
    pub fn sweep(&self) -> usize {
        let mut channels = self.channels.write();
        let before = channels.len();
        let grace = self.sub_grace;
        channels.retain(|_, channel| match channel.closed_at {
            Some(closed_at) => closed_at.elapsed() < grace,
            None => true,
        });
        before - channels.len()
    }
}

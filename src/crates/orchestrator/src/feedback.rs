//! Feedback store and analytics
//!
//! Thumbs-up/down records are append-only and immutable. Analytics aggregate
//! overall satisfaction and a per-tool breakdown, optionally filtered by
//! start date and routing decision.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Thumb direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    /// Positive
    Up,
    /// Negative
    Down,
}

/// One immutable feedback record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// Record identifier
    pub feedback_id: String,
    /// Session the feedback belongs to
    pub session_id: String,
    /// Position of the assistant message in the client's view of the history
    pub message_index: usize,
    /// Thumb direction
    pub feedback_type: FeedbackType,
    /// The query that produced the answer
    pub user_query: String,
    /// The answer being rated
    pub assistant_response: String,
    /// Tool chosen for the run, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_decision: Option<String>,
    /// Planner intent, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    /// Model that produced the answer, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    /// Record timestamp
    pub created_at: DateTime<Utc>,
}

/// Filters applied when aggregating feedback
#[derive(Debug, Clone, Default)]
pub struct FeedbackFilter {
    /// Only records created at or after this instant
    pub start_date: Option<DateTime<Utc>>,
    /// Only records for this routing decision
    pub routing_decision: Option<String>,
}

/// Satisfaction counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackCounts {
    /// All records
    pub total: usize,
    /// Positive records
    pub thumbs_up: usize,
    /// Negative records
    pub thumbs_down: usize,
    /// thumbs_up / total, zero when empty
    pub satisfaction_rate: f64,
}

impl FeedbackCounts {
    fn record(&mut self, feedback_type: FeedbackType) {
        self.total += 1;
        match feedback_type {
            FeedbackType::Up => self.thumbs_up += 1,
            FeedbackType::Down => self.thumbs_down += 1,
        }
    }

    fn finish(&mut self) {
        self.satisfaction_rate = if self.total == 0 {
            0.0
        } else {
            self.thumbs_up as f64 / self.total as f64
        };
    }
}

/// Aggregated analytics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackAnalytics {
    /// Overall counters
    #[serde(flatten)]
    pub overall: FeedbackCounts,
    /// Counters per routing decision
    pub by_routing_decision: BTreeMap<String, FeedbackCounts>,
}

/// Append-only feedback storage
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Append a record, returning its id
    async fn append(&self, record: FeedbackRecord) -> String;

    /// Records matching the filter, oldest first
    async fn query(&self, filter: &FeedbackFilter) -> Vec<FeedbackRecord>;
}

/// In-memory feedback store
#[derive(Clone, Default)]
pub struct InMemoryFeedbackStore {
    records: Arc<RwLock<Vec<FeedbackRecord>>>,
}

impl InMemoryFeedbackStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// True when nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl FeedbackStore for InMemoryFeedbackStore {
    async fn append(&self, record: FeedbackRecord) -> String {
        let id = record.feedback_id.clone();
        self.records.write().await.push(record);
        id
    }

    async fn query(&self, filter: &FeedbackFilter) -> Vec<FeedbackRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|record| {
                if let Some(start) = filter.start_date {
                    if record.created_at < start {
                        return false;
                    }
                }
                if let Some(tool) = &filter.routing_decision {
                    if record.routing_decision.as_deref() != Some(tool.as_str()) {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect()
    }
}

/// Build a feedback record with a fresh id, timestamped now
#[allow(clippy::too_many_arguments)]
pub fn new_record(
    session_id: impl Into<String>,
    message_index: usize,
    feedback_type: FeedbackType,
    user_query: impl Into<String>,
    assistant_response: impl Into<String>,
    routing_decision: Option<String>,
    intent: Option<String>,
    model_used: Option<String>,
) -> FeedbackRecord {
    FeedbackRecord {
        feedback_id: Uuid::new_v4().to_string(),
        session_id: session_id.into(),
        message_index,
        feedback_type,
        user_query: user_query.into(),
        assistant_response: assistant_response.into(),
        routing_decision,
        intent,
        model_used,
        created_at: Utc::now(),
    }
}

/// Aggregate analytics over matching records
pub async fn aggregate(store: &dyn FeedbackStore, filter: &FeedbackFilter) -> FeedbackAnalytics {
    let records = store.query(filter).await;

    let mut overall = FeedbackCounts::default();
    let mut by_tool: BTreeMap<String, FeedbackCounts> = BTreeMap::new();

    for record in &records {
        overall.record(record.feedback_type);
        let tool = record
            .routing_decision
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        by_tool.entry(tool).or_default().record(record.feedback_type);
    }

    overall.finish();
    for counts in by_tool.values_mut() {
        counts.finish();
    }

    FeedbackAnalytics {
        overall,
        by_routing_decision: by_tool,
    }
}

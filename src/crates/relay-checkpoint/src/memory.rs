//! In-memory checkpoint storage for development and testing
//!
//! Reference implementation of [`CheckpointStore`] over a thread-safe map.
//! All data is lost on restart; production deployments implement the trait
//! over a durable document store instead.

use crate::checkpoint::{Checkpoint, SessionIndex};
use crate::error::{CheckpointError, Result};
use crate::traits::CheckpointStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Checkpoints retained per session; older entries are dropped
const MAX_HISTORY_PER_SESSION: usize = 16;

#[derive(Default)]
struct Inner {
    /// Checkpoints per session, oldest first
    checkpoints: HashMap<String, Vec<Checkpoint>>,
    /// Index document per session
    index: HashMap<String, SessionIndex>,
}

/// Thread-safe in-memory checkpoint store
#[derive(Clone, Default)]
pub struct InMemoryCheckpointStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryCheckpointStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions being tracked
    pub async fn session_count(&self) -> usize {
        self.inner.read().await.checkpoints.len()
    }

    /// Total number of checkpoints across all sessions
    pub async fn checkpoint_count(&self) -> usize {
        self.inner
            .read()
            .await
            .checkpoints
            .values()
            .map(|entries| entries.len())
            .sum()
    }

    /// Drop everything (useful for test isolation)
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.checkpoints.clear();
        inner.index.clear();
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn put(&self, checkpoint: Checkpoint) -> Result<u64> {
        if checkpoint.session_id.is_empty() {
            return Err(CheckpointError::Invalid(
                "session_id must not be empty".to_string(),
            ));
        }

        let mut inner = self.inner.write().await;
        let entries = inner
            .checkpoints
            .entry(checkpoint.session_id.clone())
            .or_default();

        if let Some(last) = entries.last() {
            if checkpoint.sequence <= last.sequence {
                return Err(CheckpointError::StaleSequence {
                    session_id: checkpoint.session_id.clone(),
                    attempted: checkpoint.sequence,
                    latest: last.sequence,
                });
            }
        }

        let sequence = checkpoint.sequence;
        let index = SessionIndex::from_checkpoint(&checkpoint);
        entries.push(checkpoint);
        if entries.len() > MAX_HISTORY_PER_SESSION {
            let excess = entries.len() - MAX_HISTORY_PER_SESSION;
            entries.drain(..excess);
        }

        inner.index.insert(index.session_id.clone(), index);
        Ok(sequence)
    }

    async fn latest(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        let inner = self.inner.read().await;
        Ok(inner
            .checkpoints
            .get(session_id)
            .and_then(|entries| entries.last())
            .cloned())
    }

    async fn list_sessions(
        &self,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<SessionIndex>> {
        let inner = self.inner.read().await;
        let mut sessions: Vec<SessionIndex> = inner
            .index
            .values()
            .filter(|index| since.map_or(true, |cutoff| index.last_updated > cutoff))
            .cloned()
            .collect();

        sessions.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        sessions.truncate(limit);
        Ok(sessions)
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.checkpoints.remove(session_id);
        inner.index.remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::AgentState;

    fn checkpoint(session: &str, sequence: u64) -> Checkpoint {
        Checkpoint::new(session, sequence, AgentState::new("q", "en"))
    }

    #[tokio::test]
    async fn test_put_and_latest() {
        let store = InMemoryCheckpointStore::new();
        store.put(checkpoint("s1", 1)).await.unwrap();
        store.put(checkpoint("s1", 2)).await.unwrap();

        let latest = store.latest("s1").await.unwrap().unwrap();
        assert_eq!(latest.sequence, 2);
    }

    #[tokio::test]
    async fn test_stale_sequence_rejected() {
        let store = InMemoryCheckpointStore::new();
        store.put(checkpoint("s1", 5)).await.unwrap();

        let err = store.put(checkpoint("s1", 5)).await.unwrap_err();
        assert!(err.is_conflict());

        let err = store.put(checkpoint("s1", 3)).await.unwrap_err();
        match err {
            CheckpointError::StaleSequence {
                attempted, latest, ..
            } => {
                assert_eq!(attempted, 3);
                assert_eq!(latest, 5);
            }
            other => panic!("expected StaleSequence, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = InMemoryCheckpointStore::new();
        store.put(checkpoint("s1", 1)).await.unwrap();
        store.put(checkpoint("s2", 1)).await.unwrap();

        assert_eq!(store.session_count().await, 2);
        assert!(store.latest("s1").await.unwrap().is_some());
        assert!(store.latest("s3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_session_is_idempotent() {
        let store = InMemoryCheckpointStore::new();
        store.put(checkpoint("s1", 1)).await.unwrap();

        store.delete_session("s1").await.unwrap();
        assert!(store.latest("s1").await.unwrap().is_none());

        // Second delete must also succeed.
        store.delete_session("s1").await.unwrap();
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_list_sessions_newest_first() {
        let store = InMemoryCheckpointStore::new();
        let mut first = checkpoint("older", 1);
        first.created_at = Utc::now() - chrono::Duration::hours(2);
        store.put(first).await.unwrap();
        store.put(checkpoint("newer", 1)).await.unwrap();

        let sessions = store.list_sessions(None, 10).await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session_id, "newer");

        let cutoff = Utc::now() - chrono::Duration::hours(1);
        let recent = store.list_sessions(Some(cutoff), 10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].session_id, "newer");
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let store = InMemoryCheckpointStore::new();
        for sequence in 1..=40 {
            store.put(checkpoint("s1", sequence)).await.unwrap();
        }

        assert_eq!(store.checkpoint_count().await, MAX_HISTORY_PER_SESSION);
        let latest = store.latest("s1").await.unwrap().unwrap();
        assert_eq!(latest.sequence, 40);
    }

    #[tokio::test]
    async fn test_empty_session_id_rejected() {
        let store = InMemoryCheckpointStore::new();
        let err = store.put(checkpoint("", 1)).await.unwrap_err();
        assert!(matches!(err, CheckpointError::Invalid(_)));
    }
}

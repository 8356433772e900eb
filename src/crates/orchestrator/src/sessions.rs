//! Session service
//!
//! Thin domain layer over the checkpoint store: loads and saves canonical
//! session state, materializes chat history, and lists or deletes sessions.

use relay_checkpoint::{Checkpoint, CheckpointError, CheckpointStore, SessionIndex};
use relay_core::{AgentState, Message};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Attempts to win a sequence race before giving up
const SAVE_ATTEMPTS: usize = 5;

/// Session-level operations over the checkpoint store
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn CheckpointStore>,
}

impl SessionService {
    /// Create the service over a storage backend
    pub fn new(store: Arc<dyn CheckpointStore>) -> Self {
        Self { store }
    }

    /// Latest agent state for a session, or `None` for new sessions
    pub async fn get_state(&self, session_id: &str) -> Result<Option<AgentState>, CheckpointError> {
        Ok(self
            .store
            .latest(session_id)
            .await?
            .map(|checkpoint| checkpoint.state))
    }

    /// Persist the canonical state for a session
    ///
    /// Assigns the next monotonic sequence. A concurrent writer can win the
    /// race; the write is retried with a fresh sequence a few times, giving
    /// last-writer-wins over sequences.
    pub async fn save_state(
        &self,
        session_id: &str,
        state: &AgentState,
    ) -> Result<u64, CheckpointError> {
        let mut last_error = None;
        for _ in 0..SAVE_ATTEMPTS {
            let next_sequence = self
                .store
                .latest(session_id)
                .await?
                .map(|checkpoint| checkpoint.sequence + 1)
                .unwrap_or(1);

            match self
                .store
                .put(Checkpoint::new(session_id, next_sequence, state.clone()))
                .await
            {
                Ok(sequence) => return Ok(sequence),
                Err(e) if e.is_conflict() => {
                    tracing::debug!(session_id, "Checkpoint sequence race, retrying");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            CheckpointError::Backend("save retries exhausted".to_string())
        }))
    }

    /// Session index documents, newest first
    pub async fn list_sessions(
        &self,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<SessionIndex>, CheckpointError> {
        self.store.list_sessions(since, limit).await
    }

    /// Chat history materialized from the latest checkpoint
    pub async fn get_history(&self, session_id: &str) -> Result<Vec<Message>, CheckpointError> {
        Ok(self
            .get_state(session_id)
            .await?
            .map(|state| state.chat_history)
            .unwrap_or_default())
    }

    /// Rolling summary from the latest checkpoint
    pub async fn get_summary(&self, session_id: &str) -> Result<String, CheckpointError> {
        Ok(self
            .get_state(session_id)
            .await?
            .map(|state| state.summary)
            .unwrap_or_default())
    }

    /// Delete a session and all its checkpoints; idempotent
    pub async fn delete_session(&self, session_id: &str) -> Result<(), CheckpointError> {
        self.store.delete_session(session_id).await
    }

    /// Whether the backing store is reachable
    pub async fn is_available(&self) -> bool {
        self.store.is_available().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_checkpoint::InMemoryCheckpointStore;

    fn service() -> SessionService {
        SessionService::new(Arc::new(InMemoryCheckpointStore::new()))
    }

    #[tokio::test]
    async fn test_save_assigns_increasing_sequences() {
        let service = service();
        let state = AgentState::new("q", "en");

        assert_eq!(service.save_state("s1", &state).await.unwrap(), 1);
        assert_eq!(service.save_state("s1", &state).await.unwrap(), 2);
        assert_eq!(service.save_state("s2", &state).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_history_round_trip() {
        let service = service();
        let mut state = AgentState::new("q", "en");
        state.chat_history.push(Message::user("hello"));
        state.chat_history.push(Message::assistant("hi"));
        service.save_state("s1", &state).await.unwrap();

        let history = service.get_history("s1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "hello");
    }

    #[tokio::test]
    async fn test_unknown_session_is_empty() {
        let service = service();
        assert!(service.get_state("nope").await.unwrap().is_none());
        assert!(service.get_history("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_then_get_returns_none() {
        let service = service();
        let state = AgentState::new("q", "en");
        service.save_state("s1", &state).await.unwrap();

        service.delete_session("s1").await.unwrap();
        assert!(service.get_state("s1").await.unwrap().is_none());

        // Idempotent.
        service.delete_session("s1").await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_saves_all_land() {
        let service = service();
        let mut handles = Vec::new();
        for i in 0..4 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                let state = AgentState::new(format!("q{}", i), "en");
                service.save_state("shared", &state).await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let latest = service.get_state("shared").await.unwrap().unwrap();
        assert!(!latest.query.is_empty());
    }
}

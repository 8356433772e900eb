//! Internal retrieval adapter
//!
//! The vector store itself is an external collaborator; this module defines
//! the [`RetrieverBackend`] seam plus [`KeywordRetriever`], an in-memory
//! term-overlap retriever used for development and tests.

use super::{ToolAdapter, ToolError, ToolOptions};
use async_trait::async_trait;
use relay_core::{Evidence, ToolKind};
use std::collections::HashSet;
use std::sync::Arc;

/// Pluggable document index behind internal retrieval
#[async_trait]
pub trait RetrieverBackend: Send + Sync {
    /// Search the index, best matches first
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Evidence>, ToolError>;
}

/// One indexed document
#[derive(Debug, Clone)]
struct Document {
    text: String,
    source: String,
}

/// In-memory retriever scoring documents by query-term overlap
#[derive(Default)]
pub struct KeywordRetriever {
    documents: Vec<Document>,
}

impl KeywordRetriever {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document to the index
    pub fn add_document(&mut self, text: impl Into<String>, source: impl Into<String>) {
        self.documents.push(Document {
            text: text.into(),
            source: source.into(),
        });
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn terms(text: &str) -> HashSet<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() > 2)
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl RetrieverBackend for KeywordRetriever {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Evidence>, ToolError> {
        let query_terms = Self::terms(query);
        if query_terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f64, &Document)> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let doc_terms = Self::terms(&doc.text);
                let overlap = query_terms.intersection(&doc_terms).count();
                if overlap == 0 {
                    return None;
                }
                Some((overlap as f64 / query_terms.len() as f64, doc))
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(score, doc)| {
                Evidence::new(doc.text.clone(), doc.source.clone()).with_score(score)
            })
            .collect())
    }
}

/// Adapter dispatching internal retrieval to a configured backend
pub struct InternalRetrievalAdapter {
    backend: Option<Arc<dyn RetrieverBackend>>,
}

impl InternalRetrievalAdapter {
    /// Create an adapter; pass `None` when no index is configured
    pub fn new(backend: Option<Arc<dyn RetrieverBackend>>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ToolAdapter for InternalRetrievalAdapter {
    fn kind(&self) -> ToolKind {
        ToolKind::InternalRetrieval
    }

    fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    async fn execute(&self, query: &str, options: &ToolOptions) -> Result<Vec<Evidence>, ToolError> {
        let backend = self
            .backend
            .as_ref()
            .ok_or(ToolError::NeedsConfiguration(ToolKind::InternalRetrieval))?;
        backend.search(query, options.top_k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_retriever() -> KeywordRetriever {
        let mut retriever = KeywordRetriever::new();
        retriever.add_document(
            "The borrow checker enforces ownership rules in Rust programs",
            "docs/ownership.md",
        );
        retriever.add_document(
            "Garbage collection pauses are common in managed runtimes",
            "docs/gc.md",
        );
        retriever
    }

    #[tokio::test]
    async fn test_search_ranks_by_overlap() {
        let retriever = seeded_retriever();
        let results = retriever
            .search("how does rust ownership work", 5)
            .await
            .unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].source, "docs/ownership.md");
        assert!(results[0].score.unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_search_returns_empty_on_no_match() {
        let retriever = seeded_retriever();
        let results = retriever.search("quantum chromodynamics", 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_adapter_reports_needs_configuration() {
        let adapter = InternalRetrievalAdapter::new(None);
        assert!(!adapter.is_configured());

        let err = adapter
            .execute("anything", &ToolOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NeedsConfiguration(_)));
    }

    #[tokio::test]
    async fn test_configured_adapter_delegates() {
        let adapter = InternalRetrievalAdapter::new(Some(Arc::new(seeded_retriever())));
        assert!(adapter.is_configured());

        let results = adapter
            .execute("rust ownership", &ToolOptions::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }
}

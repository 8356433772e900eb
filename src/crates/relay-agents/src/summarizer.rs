//! Conversation summarization
//!
//! Compresses the prefix of a long conversation into a rolling summary while
//! the most recent messages stay verbatim. Two modes:
//!
//! - **Standard** - one pass over the whole compressed prefix, folding in the
//!   prior summary
//! - **Hierarchical** - for very long histories, the prefix is partitioned
//!   into fixed-size chunks that are summarized independently, then a
//!   meta-summary folds the chunk summaries and the prior summary together
//!
//! Summaries are a derived view: the message list itself is never truncated.

use relay_core::llm::{ChatMessage, ChatModel, ChatRequest};
use relay_core::{Message, Result};
use std::sync::Arc;

/// Thresholds governing when and how summarization runs
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// History length below which summarization is skipped
    pub min_history: usize,
    /// History length at which hierarchical mode kicks in
    pub hierarchical_threshold: usize,
    /// Messages per chunk in hierarchical mode
    pub chunk_size: usize,
    /// Trailing messages left uncompressed
    pub keep_recent: usize,
    /// Hard cap on summary length, in characters
    pub summary_char_cap: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            min_history: 10,
            hierarchical_threshold: 100,
            chunk_size: 20,
            keep_recent: 4,
            summary_char_cap: 4096,
        }
    }
}

/// Which strategy produced a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryMode {
    /// Single-pass summarization
    Standard,
    /// Chunked summarization with a meta pass
    Hierarchical,
}

/// A produced summary plus its production trace
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    /// The new rolling summary
    pub summary: String,
    /// Intermediate chunk summaries (empty in standard mode)
    pub chunk_summaries: Vec<String>,
    /// Strategy used
    pub mode: SummaryMode,
}

/// Conversation summarizer
pub struct Summarizer {
    llm: Arc<dyn ChatModel>,
    config: SummarizerConfig,
}

impl Summarizer {
    /// Create a summarizer over the given model
    pub fn new(llm: Arc<dyn ChatModel>, config: SummarizerConfig) -> Self {
        Self { llm, config }
    }

    /// Thresholds in effect
    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    /// Summarize a conversation, or return `None` below the minimum length
    ///
    /// The compressed prefix excludes the trailing `keep_recent` messages,
    /// so the produced summary covers exactly `history[..len - keep_recent]`.
    pub async fn summarize(
        &self,
        history: &[Message],
        prior_summary: &str,
    ) -> Result<Option<SummaryOutcome>> {
        if history.len() < self.config.min_history {
            return Ok(None);
        }

        let prefix_end = history.len().saturating_sub(self.config.keep_recent);
        let prefix = &history[..prefix_end];

        let outcome = if history.len() >= self.config.hierarchical_threshold {
            self.hierarchical(prefix, prior_summary).await?
        } else {
            self.standard(prefix, prior_summary).await?
        };
        Ok(Some(outcome))
    }

    async fn standard(&self, prefix: &[Message], prior_summary: &str) -> Result<SummaryOutcome> {
        let prompt = format!(
            "Rewrite the conversation summary so it covers everything below.\n\n\
             Existing summary:\n{}\n\nConversation:\n{}\n\n\
             Reply with the updated summary only. Keep it under {} characters.",
            if prior_summary.is_empty() {
                "(none)"
            } else {
                prior_summary
            },
            transcript(prefix),
            self.config.summary_char_cap,
        );

        let response = self
            .llm
            .chat(ChatRequest::new(vec![ChatMessage::user(prompt)]))
            .await?;

        Ok(SummaryOutcome {
            summary: self.cap(response.content.trim()),
            chunk_summaries: Vec::new(),
            mode: SummaryMode::Standard,
        })
    }

    async fn hierarchical(&self, prefix: &[Message], prior_summary: &str) -> Result<SummaryOutcome> {
        let mut chunk_summaries = Vec::new();
        for chunk in prefix.chunks(self.config.chunk_size) {
            let prompt = format!(
                "Summarize this conversation excerpt in a few sentences:\n\n{}",
                transcript(chunk)
            );
            let response = self
                .llm
                .chat(ChatRequest::new(vec![ChatMessage::user(prompt)]))
                .await?;
            chunk_summaries.push(response.content.trim().to_string());
        }

        let prompt = format!(
            "Combine the prior summary and the section summaries below into one \
             coherent summary of the whole conversation.\n\n\
             Prior summary:\n{}\n\nSection summaries:\n{}\n\n\
             Reply with the combined summary only. Keep it under {} characters.",
            if prior_summary.is_empty() {
                "(none)"
            } else {
                prior_summary
            },
            chunk_summaries
                .iter()
                .enumerate()
                .map(|(i, s)| format!("{}. {}", i + 1, s))
                .collect::<Vec<_>>()
                .join("\n"),
            self.config.summary_char_cap,
        );

        let response = self
            .llm
            .chat(ChatRequest::new(vec![ChatMessage::user(prompt)]))
            .await?;

        Ok(SummaryOutcome {
            summary: self.cap(response.content.trim()),
            chunk_summaries,
            mode: SummaryMode::Hierarchical,
        })
    }

    fn cap(&self, summary: &str) -> String {
        if summary.chars().count() <= self.config.summary_char_cap {
            return summary.to_string();
        }
        summary.chars().take(self.config.summary_char_cap).collect()
    }
}

/// Render messages as a plain transcript
fn transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm::ScriptedChatModel;

    fn history(pairs: usize) -> Vec<Message> {
        let mut messages = Vec::new();
        for i in 0..pairs {
            messages.push(Message::user(format!("question {}", i)));
            messages.push(Message::assistant(format!("answer {}", i)));
        }
        messages
    }

    #[tokio::test]
    async fn test_short_history_is_skipped() {
        let model = Arc::new(ScriptedChatModel::empty());
        let summarizer = Summarizer::new(model.clone(), SummarizerConfig::default());

        let outcome = summarizer.summarize(&history(4), "").await.unwrap();
        assert!(outcome.is_none());
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_standard_mode_single_call() {
        let model = Arc::new(ScriptedChatModel::new(vec!["a fresh summary"]));
        let summarizer = Summarizer::new(model.clone(), SummarizerConfig::default());

        let outcome = summarizer
            .summarize(&history(10), "old summary")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.mode, SummaryMode::Standard);
        assert_eq!(outcome.summary, "a fresh summary");
        assert!(outcome.chunk_summaries.is_empty());
        assert_eq!(model.call_count(), 1);

        // The prompt must cover the prefix but not the trailing messages.
        let prompt = &model.requests()[0].messages[0].content;
        assert!(prompt.contains("question 0"));
        assert!(prompt.contains("old summary"));
        assert!(!prompt.contains("answer 9"));
    }

    #[tokio::test]
    async fn test_hierarchical_mode_chunks_prefix() {
        // 120 messages → prefix of 116 → six chunks of 20 plus the meta call.
        let model = Arc::new(ScriptedChatModel::empty());
        let summarizer = Summarizer::new(model.clone(), SummarizerConfig::default());

        let outcome = summarizer
            .summarize(&history(60), "prior")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.mode, SummaryMode::Hierarchical);
        assert_eq!(outcome.chunk_summaries.len(), 6);
        assert_eq!(model.call_count(), 7);
    }

    #[tokio::test]
    async fn test_summary_is_capped() {
        let model = Arc::new(ScriptedChatModel::new(vec!["y".repeat(10_000)]));
        let summarizer = Summarizer::new(model, SummarizerConfig::default());

        let outcome = summarizer
            .summarize(&history(10), "")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.summary.chars().count(), 4096);
    }
}

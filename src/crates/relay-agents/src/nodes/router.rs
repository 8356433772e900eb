//! Router node
//!
//! Picks a tool for the query. Cheap deterministic heuristics run first
//! (explicit URLs, arithmetic, translation intent, document-style queries);
//! only when none applies is the language model consulted. The router never
//! selects a tool whose backend reports `needs_configuration`, and defaults
//! to a direct answer when confidence is insufficient.

use super::{context_block, extract_json, NodeSettings};
use crate::tools::{calculator, ToolRegistry};
use async_trait::async_trait;
use regex::Regex;
use relay_core::llm::{ChatMessage, ChatModel, ChatRequest};
use relay_core::{AgentNode, AgentState, NodeKind, Result, RoutingDecision, StateDelta, ToolKind};
use std::sync::{Arc, OnceLock};

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://[^\s)\]]+").expect("valid regex"))
}

fn translate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*translate\b|\btranslate\b.+\b(?:to|into)\s+\p{L}+").expect("valid regex")
    })
}

fn quoted_title_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""[^"]{3,}"|“[^”]{3,}”"#).expect("valid regex"))
}

const DOCUMENT_HINTS: [&str; 8] = [
    "book", "document", "report", "paper", "manual", "guide", "chapter", "internal docs",
];

/// Tool selection node
pub struct RouterNode {
    llm: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    settings: NodeSettings,
}

impl RouterNode {
    /// Create the router
    pub fn new(llm: Arc<dyn ChatModel>, tools: Arc<ToolRegistry>, settings: NodeSettings) -> Self {
        Self {
            llm,
            tools,
            settings,
        }
    }

    fn looks_like_document_query(query: &str) -> bool {
        let lower = query.to_lowercase();
        quoted_title_regex().is_match(query)
            || DOCUMENT_HINTS.iter().any(|hint| lower.contains(hint))
    }

    /// Deterministic routing, when the query makes the tool obvious
    fn heuristic(&self, query: &str) -> Option<RoutingDecision> {
        if let Some(url) = url_regex().find(query) {
            if self.tools.is_configured(ToolKind::TargetedCrawl) {
                return Some(
                    RoutingDecision::new(ToolKind::TargetedCrawl, "query names an explicit URL")
                        .with_target(url.as_str().trim_end_matches(['.', ','])),
                );
            }
        }

        if calculator::parses(query) {
            return Some(RoutingDecision::new(
                ToolKind::Calculator,
                "query is an arithmetic expression",
            ));
        }

        if translate_regex().is_match(query) {
            return Some(RoutingDecision::new(
                ToolKind::Translate,
                "query asks for a translation",
            ));
        }

        if Self::looks_like_document_query(query)
            && self.tools.is_configured(ToolKind::InternalRetrieval)
        {
            return Some(RoutingDecision::new(
                ToolKind::InternalRetrieval,
                "query names a document or title held in the internal index",
            ));
        }

        None
    }

    fn routable_tools(&self) -> Vec<ToolKind> {
        ToolKind::ALL
            .into_iter()
            .filter(|kind| match kind {
                // These need no external backend.
                ToolKind::Calculator | ToolKind::Translate | ToolKind::DirectAnswer => true,
                _ => self.tools.is_configured(*kind),
            })
            .collect()
    }

    /// Ask the model to route, validating its choice against configured tools
    async fn llm_route(&self, state: &AgentState) -> Result<RoutingDecision> {
        let available = self.routable_tools();
        let tool_list = available
            .iter()
            .map(|kind| format!("- {}", kind.as_str()))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "{}Pick the best tool for answering the user's question.\n\
             Available tools:\n{}\n\n\
             Question: {}\n\n\
             Reply with JSON only: {{\"tool\": \"<name>\", \"reasoning\": \"<why>\"}}.\n\
             Prefer internal_retrieval over web_search for questions about \
             specific documents or titles. Use direct_answer when unsure.",
            context_block(state, self.settings.keep_recent),
            tool_list,
            state.query,
        );

        let response = self
            .llm
            .chat(ChatRequest::new(vec![ChatMessage::user(prompt)]))
            .await?;

        let parsed = extract_json(&response.content).and_then(|value| {
            let tool = value.get("tool")?.as_str()?.to_string();
            let reasoning = value
                .get("reasoning")
                .and_then(|r| r.as_str())
                .unwrap_or("model routing")
                .to_string();
            Some((tool, reasoning))
        });

        let Some((tool_name, reasoning)) = parsed else {
            tracing::warn!("Router reply was not parseable; defaulting to direct answer");
            return Ok(RoutingDecision::new(
                ToolKind::DirectAnswer,
                "routing confidence insufficient",
            ));
        };

        let chosen = available
            .iter()
            .find(|kind| kind.as_str() == tool_name)
            .copied();

        Ok(match chosen {
            Some(tool) => RoutingDecision::new(tool, reasoning),
            None => RoutingDecision::new(
                ToolKind::DirectAnswer,
                format!("model chose unavailable tool '{}'", tool_name),
            ),
        })
    }
}

#[async_trait]
impl AgentNode for RouterNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Router
    }

    async fn run(&self, state: &AgentState) -> Result<StateDelta> {
        let decision = match self.heuristic(&state.query) {
            Some(decision) => decision,
            None => self.llm_route(state).await?,
        };

        tracing::debug!(tool = decision.tool.as_str(), "Routed query");
        Ok(StateDelta::new().with_routing_decision(decision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{
        AdapterSettings, CalculatorAdapter, InternalRetrievalAdapter, KeywordRetriever,
        TargetedCrawlAdapter, WebSearchAdapter,
    };
    use llm::ScriptedChatModel;

    fn full_registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new(AdapterSettings::default());
        registry.register(Arc::new(CalculatorAdapter::new()));
        registry.register(Arc::new(TargetedCrawlAdapter::new()));
        registry.register(Arc::new(InternalRetrievalAdapter::new(Some(Arc::new(
            KeywordRetriever::new(),
        )))));
        registry.register(Arc::new(WebSearchAdapter::new(None)));
        Arc::new(registry)
    }

    fn router(llm: Arc<ScriptedChatModel>) -> RouterNode {
        RouterNode::new(llm, full_registry(), NodeSettings::default())
    }

    #[tokio::test]
    async fn test_arithmetic_routes_to_calculator() {
        let llm = Arc::new(ScriptedChatModel::empty());
        let node = router(llm.clone());

        let state = AgentState::new("What is 15% of 1500?", "en");
        let delta = node.run(&state).await.unwrap();

        assert_eq!(
            delta.routing_decision.unwrap().tool,
            ToolKind::Calculator
        );
        // Heuristic path: the model must not have been called.
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_url_routes_to_crawl_with_target() {
        let node = router(Arc::new(ScriptedChatModel::empty()));

        let state = AgentState::new("summarize https://example.com/post please", "en");
        let decision = node.run(&state).await.unwrap().routing_decision.unwrap();

        assert_eq!(decision.tool, ToolKind::TargetedCrawl);
        assert_eq!(decision.target.as_deref(), Some("https://example.com/post"));
    }

    #[tokio::test]
    async fn test_translation_intent() {
        let node = router(Arc::new(ScriptedChatModel::empty()));

        let state = AgentState::new("translate good morning to french", "en");
        let decision = node.run(&state).await.unwrap().routing_decision.unwrap();
        assert_eq!(decision.tool, ToolKind::Translate);
    }

    #[tokio::test]
    async fn test_document_query_prefers_internal_retrieval() {
        let node = router(Arc::new(ScriptedChatModel::empty()));

        let state = AgentState::new("what does the onboarding manual say about laptops", "en");
        let decision = node.run(&state).await.unwrap().routing_decision.unwrap();
        assert_eq!(decision.tool, ToolKind::InternalRetrieval);
    }

    #[tokio::test]
    async fn test_llm_route_parses_model_choice() {
        let llm = Arc::new(ScriptedChatModel::new(vec![
            r#"{"tool": "internal_retrieval", "reasoning": "document lookup"}"#,
        ]));
        let node = router(llm);

        let state = AgentState::new("tell me something interesting", "en");
        let decision = node.run(&state).await.unwrap().routing_decision.unwrap();
        assert_eq!(decision.tool, ToolKind::InternalRetrieval);
        assert_eq!(decision.reasoning, "document lookup");
    }

    #[tokio::test]
    async fn test_unparseable_model_reply_defaults_to_direct_answer() {
        let llm = Arc::new(ScriptedChatModel::new(vec!["I would use the web, maybe?"]));
        let node = router(llm);

        let state = AgentState::new("tell me something interesting", "en");
        let decision = node.run(&state).await.unwrap().routing_decision.unwrap();
        assert_eq!(decision.tool, ToolKind::DirectAnswer);
    }

    #[tokio::test]
    async fn test_unconfigured_tool_choice_is_rejected() {
        // web_search is registered but unconfigured; the model picks it anyway.
        let llm = Arc::new(ScriptedChatModel::new(vec![
            r#"{"tool": "web_search", "reasoning": "fresh info"}"#,
        ]));
        let node = router(llm);

        let state = AgentState::new("latest rust release notes", "en");
        let decision = node.run(&state).await.unwrap().routing_decision.unwrap();
        assert_eq!(decision.tool, ToolKind::DirectAnswer);
    }
}

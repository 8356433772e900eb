//! Agent state carried through a pipeline run
//!
//! The whole run operates on a single [`AgentState`] record. Nodes never
//! mutate it directly; they return a partial [`StateDelta`] which the runtime
//! merges and streams to subscribers as the `state_delta` event payload.

use crate::messages::Message;
use serde::{Deserialize, Serialize};

/// Closed set of tools the router can choose from
///
/// Adding a tool is a code change on purpose: exhaustive matches keep
/// dispatch and cost accounting predictable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// General web search
    WebSearch,
    /// Fetch and extract a specific URL
    TargetedCrawl,
    /// Query the internal document index
    InternalRetrieval,
    /// Arithmetic expression evaluation
    Calculator,
    /// Translate the query text itself
    Translate,
    /// Answer from model knowledge without evidence
    DirectAnswer,
}

impl ToolKind {
    /// Tool name as used on the wire and in analytics
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::WebSearch => "web_search",
            ToolKind::TargetedCrawl => "targeted_crawl",
            ToolKind::InternalRetrieval => "internal_retrieval",
            ToolKind::Calculator => "calculator",
            ToolKind::Translate => "translate",
            ToolKind::DirectAnswer => "direct_answer",
        }
    }

    /// Whether this routing skips the planner and retrieval stages
    pub fn skips_retrieval(&self) -> bool {
        matches!(
            self,
            ToolKind::Calculator | ToolKind::DirectAnswer | ToolKind::Translate
        )
    }

    /// All routable kinds
    pub const ALL: [ToolKind; 6] = [
        ToolKind::WebSearch,
        ToolKind::TargetedCrawl,
        ToolKind::InternalRetrieval,
        ToolKind::Calculator,
        ToolKind::Translate,
        ToolKind::DirectAnswer,
    ];
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The router's choice of tool for the current query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Selected tool
    pub tool: ToolKind,
    /// Short justification of the choice
    pub reasoning: String,
    /// Target URL for targeted_crawl
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl RoutingDecision {
    /// Create a decision with the given tool and reasoning
    pub fn new(tool: ToolKind, reasoning: impl Into<String>) -> Self {
        Self {
            tool,
            reasoning: reasoning.into(),
            target: None,
        }
    }

    /// Attach a crawl target
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// A normalized unit of retrieved content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Extracted text
    pub text: String,
    /// Origin (URL, document id, or tool name)
    pub source: String,
    /// Relevance score when the backend provides one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Evidence {
    /// Create evidence without a score
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            score: None,
        }
    }

    /// Attach a relevance score
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}

/// Critic verdict over a draft answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Draft is acceptable
    Approved,
    /// Draft should be regenerated with the critic's instructions
    NeedsRevision,
    /// Safety or policy violation; the draft must not be shown
    Rejected,
}

impl Verdict {
    /// Verdict name as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Approved => "approved",
            Verdict::NeedsRevision => "needs_revision",
            Verdict::Rejected => "rejected",
        }
    }
}

/// Critic output over the current draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Critique {
    /// Overall verdict
    pub verdict: Verdict,
    /// Reasons backing the verdict
    pub reasons: Vec<String>,
    /// Concrete revision instructions for the generator
    pub instructions: String,
}

impl Critique {
    /// Create an approval with no further instructions
    pub fn approved() -> Self {
        Self {
            verdict: Verdict::Approved,
            reasons: Vec::new(),
            instructions: String::new(),
        }
    }
}

/// Failure information recorded in state when a stage gives up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFailure {
    /// Node name where the failure occurred
    pub stage: String,
    /// Human-readable description
    pub message: String,
    /// Whether a retry might have succeeded
    pub retryable: bool,
}

/// Complete state of one pipeline run
///
/// This is both the in-memory record nodes operate on and the persisted
/// checkpoint body. Prompt context handed to nodes is always
/// `{summary, tail(keep_recent)}`; the full history is only ever read for
/// summarization and session materialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// Current user input
    pub query: String,
    /// Ordered messages from prior turns
    pub chat_history: Vec<Message>,
    /// Rolling summary of the compressed history prefix
    pub summary: String,
    /// Router output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_decision: Option<RoutingDecision>,
    /// Planner's reading of what the user wants
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    /// Ordered plan steps
    pub plan: Vec<String>,
    /// Evidence gathered by the retrieval stage
    pub retrieved_context: Vec<Evidence>,
    /// Latest generator output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_answer: Option<String>,
    /// Indices into retrieved_context cited by the draft
    pub citations: Vec<usize>,
    /// Latest critic output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critique: Option<Critique>,
    /// Number of generator re-runs taken so far
    pub revision_count: u32,
    /// Answer delivered to the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
    /// Language the final answer must be rendered in
    pub target_language: String,
    /// Non-fatal issues recorded during the run
    pub warnings: Vec<String>,
    /// Fatal failure, when the run ended on the error terminal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RunFailure>,
}

impl AgentState {
    /// Create the initial state for a new run
    pub fn new(query: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            chat_history: Vec::new(),
            summary: String::new(),
            routing_decision: None,
            intent: None,
            plan: Vec::new(),
            retrieved_context: Vec::new(),
            draft_answer: None,
            citations: Vec::new(),
            critique: None,
            revision_count: 0,
            final_answer: None,
            target_language: target_language.into(),
            warnings: Vec::new(),
            error: None,
        }
    }

    /// Seed the state with prior conversation context
    pub fn with_history(mut self, history: Vec<Message>, summary: impl Into<String>) -> Self {
        self.chat_history = history;
        self.summary = summary.into();
        self
    }

    /// The uncompressed tail of the history used as prompt context
    pub fn recent_history(&self, keep_recent: usize) -> &[Message] {
        let len = self.chat_history.len();
        &self.chat_history[len.saturating_sub(keep_recent)..]
    }

    /// Merge a partial update into this state
    pub fn apply(&mut self, delta: StateDelta) {
        if let Some(routing_decision) = delta.routing_decision {
            self.routing_decision = Some(routing_decision);
        }
        if let Some(intent) = delta.intent {
            self.intent = Some(intent);
        }
        if let Some(plan) = delta.plan {
            self.plan = plan;
        }
        if let Some(retrieved_context) = delta.retrieved_context {
            self.retrieved_context = retrieved_context;
        }
        if let Some(draft_answer) = delta.draft_answer {
            self.draft_answer = Some(draft_answer);
        }
        if let Some(citations) = delta.citations {
            self.citations = citations;
        }
        if let Some(critique) = delta.critique {
            self.critique = Some(critique);
        }
        if let Some(final_answer) = delta.final_answer {
            self.final_answer = Some(final_answer);
        }
        if let Some(summary) = delta.summary {
            self.summary = summary;
        }
        if let Some(warning) = delta.warning {
            self.warnings.push(warning);
        }
        if let Some(error) = delta.error {
            self.error = Some(error);
        }
    }
}

/// Partial state update returned by a node
///
/// Serialization omits unset fields, so the serialized form is exactly the
/// diff payload of the `state_delta` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_decision: Option<RoutingDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieved_context: Option<Vec<Evidence>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critique: Option<Critique>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RunFailure>,
}

impl StateDelta {
    /// Create an empty delta
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the routing decision
    pub fn with_routing_decision(mut self, decision: RoutingDecision) -> Self {
        self.routing_decision = Some(decision);
        self
    }

    /// Set the intent
    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    /// Set the plan steps
    pub fn with_plan(mut self, plan: Vec<String>) -> Self {
        self.plan = Some(plan);
        self
    }

    /// Set the retrieved evidence
    pub fn with_retrieved_context(mut self, evidence: Vec<Evidence>) -> Self {
        self.retrieved_context = Some(evidence);
        self
    }

    /// Set the draft answer
    pub fn with_draft_answer(mut self, draft: impl Into<String>) -> Self {
        self.draft_answer = Some(draft.into());
        self
    }

    /// Set the citations
    pub fn with_citations(mut self, citations: Vec<usize>) -> Self {
        self.citations = Some(citations);
        self
    }

    /// Set the critique
    pub fn with_critique(mut self, critique: Critique) -> Self {
        self.critique = Some(critique);
        self
    }

    /// Set the final answer
    pub fn with_final_answer(mut self, answer: impl Into<String>) -> Self {
        self.final_answer = Some(answer.into());
        self
    }

    /// Set the summary
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Record a non-fatal warning
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        *self == StateDelta::default()
    }
}

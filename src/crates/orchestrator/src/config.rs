//! Service configuration
//!
//! Defaults → optional TOML file (`RELAY_CONFIG` path) → environment
//! variables, later layers winning. Every knob of the pipeline lives here so
//! the binary, the workers and the tests all read one source of truth.

use relay_agents::{AdapterSettings, NodeSettings, SummarizerConfig};
use relay_core::RunLimits;
use serde::Deserialize;
use std::time::Duration;
use tooling::config::env::{get_env, get_env_bool_or, get_env_or, get_env_parse_or};
use tooling::{Result, ToolingError};

/// Complete runtime configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Workers competing on the queue
    pub worker_count: usize,

    /// Default model name passed to the LLM client
    pub llm_model: String,
    /// Language answers are drafted in
    pub base_language: String,

    /// Cap on generator re-runs per turn
    pub max_revisions: u32,
    /// Trailing messages kept uncompressed as prompt context
    pub keep_recent_messages: usize,
    /// History length at which hierarchical summarization kicks in
    pub hierarchical_threshold: usize,
    /// Messages per chunk in hierarchical mode
    pub chunk_size: usize,
    /// Hard cap on summary length, in characters
    pub summary_char_cap: usize,

    /// Queue claim timeout
    pub claim_timeout: Duration,
    /// Default per-node timeout
    pub node_timeout: Duration,
    /// Retrieval node timeout
    pub retrieval_timeout: Duration,
    /// Generator node timeout
    pub generator_timeout: Duration,
    /// Whole-job deadline
    pub job_deadline: Duration,

    /// Events kept per request for replay
    pub replay_buffer: usize,
    /// How long terminal channels remain subscribable
    pub sub_grace: Duration,

    /// Re-dispatch empty internal retrieval to web search
    pub fallback_web_on_empty_retrieval: bool,
    /// Web search API key
    pub web_search_key: Option<String>,
    /// Web search endpoint
    pub web_search_endpoint: Option<String>,
    /// Path to the internal retriever index (JSON lines)
    pub retriever_index_path: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            worker_count: 2,
            llm_model: "gpt-4o-mini".to_string(),
            base_language: "en".to_string(),
            max_revisions: 2,
            keep_recent_messages: 4,
            hierarchical_threshold: 100,
            chunk_size: 20,
            summary_char_cap: 4096,
            claim_timeout: Duration::from_secs(5),
            node_timeout: Duration::from_secs(60),
            retrieval_timeout: Duration::from_secs(120),
            generator_timeout: Duration::from_secs(180),
            job_deadline: Duration::from_secs(600),
            replay_buffer: 64,
            sub_grace: Duration::from_secs(300),
            fallback_web_on_empty_retrieval: true,
            web_search_key: None,
            web_search_endpoint: None,
            retriever_index_path: None,
        }
    }
}

/// Optional TOML overlay; every field may be omitted
#[derive(Debug, Default, Deserialize)]
struct ConfigOverlay {
    host: Option<String>,
    port: Option<u16>,
    worker_count: Option<usize>,
    llm_model: Option<String>,
    base_language: Option<String>,
    max_revisions: Option<u32>,
    keep_recent_messages: Option<usize>,
    hierarchical_threshold: Option<usize>,
    chunk_size: Option<usize>,
    summary_char_cap: Option<usize>,
    claim_timeout_secs: Option<u64>,
    node_timeout_secs: Option<u64>,
    retrieval_timeout_secs: Option<u64>,
    generator_timeout_secs: Option<u64>,
    job_deadline_secs: Option<u64>,
    replay_buffer: Option<usize>,
    sub_grace_secs: Option<u64>,
    fallback_web_on_empty_retrieval: Option<bool>,
    web_search_key: Option<String>,
    web_search_endpoint: Option<String>,
    retriever_index_path: Option<String>,
}

impl ServiceConfig {
    /// Load configuration: defaults, then TOML file, then environment
    pub fn load() -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = get_env("RELAY_CONFIG")? {
            let raw = std::fs::read_to_string(&path)?;
            let overlay: ConfigOverlay = toml::from_str(&raw)
                .map_err(|e| ToolingError::General(format!("invalid config file {path}: {e}")))?;
            config.apply_overlay(overlay);
        }
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        macro_rules! set {
            ($field:ident) => {
                if let Some(value) = overlay.$field {
                    self.$field = value;
                }
            };
            ($field:ident, secs $src:ident) => {
                if let Some(value) = overlay.$src {
                    self.$field = Duration::from_secs(value);
                }
            };
        }
        set!(host);
        set!(port);
        set!(worker_count);
        set!(llm_model);
        set!(base_language);
        set!(max_revisions);
        set!(keep_recent_messages);
        set!(hierarchical_threshold);
        set!(chunk_size);
        set!(summary_char_cap);
        set!(claim_timeout, secs claim_timeout_secs);
        set!(node_timeout, secs node_timeout_secs);
        set!(retrieval_timeout, secs retrieval_timeout_secs);
        set!(generator_timeout, secs generator_timeout_secs);
        set!(job_deadline, secs job_deadline_secs);
        set!(replay_buffer);
        set!(sub_grace, secs sub_grace_secs);
        set!(fallback_web_on_empty_retrieval);
        if overlay.web_search_key.is_some() {
            self.web_search_key = overlay.web_search_key;
        }
        if overlay.web_search_endpoint.is_some() {
            self.web_search_endpoint = overlay.web_search_endpoint;
        }
        if overlay.retriever_index_path.is_some() {
            self.retriever_index_path = overlay.retriever_index_path;
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        self.host = get_env_or("HOST", self.host.clone())?;
        self.port = get_env_parse_or("PORT", self.port)?;
        self.worker_count = get_env_parse_or("WORKER_COUNT", self.worker_count)?;
        self.llm_model = get_env_or("LLM_MODEL", self.llm_model.clone())?;
        self.base_language = get_env_or("BASE_LANGUAGE", self.base_language.clone())?;
        self.max_revisions = get_env_parse_or("MAX_REVISIONS", self.max_revisions)?;
        self.keep_recent_messages =
            get_env_parse_or("KEEP_RECENT_MESSAGES", self.keep_recent_messages)?;
        self.hierarchical_threshold =
            get_env_parse_or("HIERARCHICAL_THRESHOLD", self.hierarchical_threshold)?;
        self.chunk_size = get_env_parse_or("CHUNK_SIZE", self.chunk_size)?;
        self.summary_char_cap = get_env_parse_or("SUMMARY_CHAR_CAP", self.summary_char_cap)?;
        self.claim_timeout =
            Duration::from_secs(get_env_parse_or("T_CLAIM", self.claim_timeout.as_secs())?);
        self.node_timeout =
            Duration::from_secs(get_env_parse_or("T_NODE", self.node_timeout.as_secs())?);
        self.retrieval_timeout = Duration::from_secs(get_env_parse_or(
            "T_RETRIEVAL",
            self.retrieval_timeout.as_secs(),
        )?);
        self.generator_timeout = Duration::from_secs(get_env_parse_or(
            "T_GENERATOR",
            self.generator_timeout.as_secs(),
        )?);
        self.job_deadline =
            Duration::from_secs(get_env_parse_or("T_JOB", self.job_deadline.as_secs())?);
        self.replay_buffer = get_env_parse_or("REPLAY_BUFFER", self.replay_buffer)?;
        self.sub_grace =
            Duration::from_secs(get_env_parse_or("SUB_GRACE", self.sub_grace.as_secs())?);
        self.fallback_web_on_empty_retrieval = get_env_bool_or(
            "FALLBACK_WEB_ON_EMPTY_RETRIEVAL",
            self.fallback_web_on_empty_retrieval,
        )?;
        if let Some(key) = get_env("WEB_SEARCH_KEY")? {
            self.web_search_key = Some(key);
        }
        if let Some(endpoint) = get_env("WEB_SEARCH_ENDPOINT")? {
            self.web_search_endpoint = Some(endpoint);
        }
        if let Some(path) = get_env("RETRIEVER_INDEX_PATH")? {
            self.retriever_index_path = Some(path);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(ToolingError::General(
                "WORKER_COUNT must be at least 1".to_string(),
            ));
        }
        if self.keep_recent_messages >= self.hierarchical_threshold {
            return Err(ToolingError::General(
                "KEEP_RECENT_MESSAGES must be below HIERARCHICAL_THRESHOLD".to_string(),
            ));
        }
        if self.replay_buffer == 0 {
            return Err(ToolingError::General(
                "REPLAY_BUFFER must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Budgets handed to the graph runner
    pub fn run_limits(&self) -> RunLimits {
        RunLimits {
            max_revisions: self.max_revisions,
            base_language: self.base_language.clone(),
            node_timeout: self.node_timeout,
            retrieval_timeout: self.retrieval_timeout,
            generator_timeout: self.generator_timeout,
            job_deadline: self.job_deadline,
            ..RunLimits::default()
        }
    }

    /// Thresholds handed to the summarizer
    pub fn summarizer_config(&self) -> SummarizerConfig {
        SummarizerConfig {
            min_history: 10,
            hierarchical_threshold: self.hierarchical_threshold,
            chunk_size: self.chunk_size,
            keep_recent: self.keep_recent_messages,
            summary_char_cap: self.summary_char_cap,
        }
    }

    /// Settings handed to the prompt-building nodes
    pub fn node_settings(&self) -> NodeSettings {
        NodeSettings {
            keep_recent: self.keep_recent_messages,
            base_language: self.base_language.clone(),
            fallback_web_on_empty_retrieval: self.fallback_web_on_empty_retrieval,
        }
    }

    /// Policy handed to the tool registry
    pub fn adapter_settings(&self) -> AdapterSettings {
        AdapterSettings::default()
    }
}

//! Shared wiring for integration tests
//!
//! Builds a complete pipeline (broker, store, tools, nodes, one worker) over
//! a scripted language model so runs are deterministic.

#![allow(dead_code)]

use async_trait::async_trait;
use llm::ScriptedChatModel;
use orchestrator::broker::{Broker, EventEnvelope, Job};
use orchestrator::sessions::SessionService;
use orchestrator::worker::Worker;
use relay_agents::{
    build_registry, AdapterSettings, CalculatorAdapter, InternalRetrievalAdapter,
    KeywordRetriever, NodeSettings, Summarizer, SummarizerConfig, TargetedCrawlAdapter,
    ToolAdapter, ToolError, ToolOptions, ToolRegistry,
};
use relay_checkpoint::InMemoryCheckpointStore;
use relay_core::{Evidence, RunLimits, ToolKind};
use std::sync::Arc;
use std::time::Duration;

/// Web search stand-in returning fixed results
pub struct StaticSearch {
    results: Vec<Evidence>,
}

#[async_trait]
impl ToolAdapter for StaticSearch {
    fn kind(&self) -> ToolKind {
        ToolKind::WebSearch
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        _query: &str,
        _options: &ToolOptions,
    ) -> Result<Vec<Evidence>, ToolError> {
        Ok(self.results.clone())
    }
}

/// A fully wired single-worker pipeline
pub struct Harness {
    pub broker: Arc<Broker>,
    pub sessions: SessionService,
    pub store: Arc<InMemoryCheckpointStore>,
    pub worker: Worker,
    pub llm: Arc<ScriptedChatModel>,
    registry: relay_core::NodeRegistry,
}

impl Harness {
    /// Build a worker with custom run budgets over the same wiring
    pub fn worker_with_limits(&self, id: usize, limits: RunLimits) -> Worker {
        Worker::new(
            id,
            self.broker.clone(),
            self.sessions.clone(),
            self.registry.clone(),
            limits,
            Duration::from_millis(100),
        )
        .expect("complete registry")
    }

    /// Build another worker over the same broker, store and node wiring
    pub fn extra_worker(&self, id: usize) -> Worker {
        Worker::new(
            id,
            self.broker.clone(),
            self.sessions.clone(),
            self.registry.clone(),
            RunLimits {
                retry_backoff: Duration::from_millis(1),
                ..RunLimits::default()
            },
            Duration::from_millis(100),
        )
        .expect("complete registry")
    }

    /// Process one job to its terminal event and return every event published
    pub async fn run(&self, job: Job) -> Vec<EventEnvelope> {
        let request_id = job.request_id.clone();
        self.broker.events.open(&request_id);
        self.worker.process(job).await;
        self.broker
            .events
            .subscribe(&request_id)
            .expect("channel within grace")
            .backlog
    }
}

/// Build a harness over the given script and tool fixtures
pub fn harness(
    responses: Vec<&str>,
    web_results: Option<Vec<Evidence>>,
    retriever: Option<KeywordRetriever>,
) -> Harness {
    let llm = Arc::new(ScriptedChatModel::new(responses));

    let mut tools = ToolRegistry::new(AdapterSettings {
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
        ..AdapterSettings::default()
    });
    tools.register(Arc::new(CalculatorAdapter::new()));
    tools.register(Arc::new(TargetedCrawlAdapter::new()));
    if let Some(results) = web_results {
        tools.register(Arc::new(StaticSearch { results }));
    }
    tools.register(Arc::new(InternalRetrievalAdapter::new(
        retriever.map(|r| Arc::new(r) as Arc<dyn relay_agents::RetrieverBackend>),
    )));
    let tools = Arc::new(tools);

    let summarizer = Arc::new(Summarizer::new(llm.clone(), SummarizerConfig::default()));
    let registry = build_registry(
        llm.clone(),
        tools,
        summarizer,
        NodeSettings::default(),
    );

    let broker = Arc::new(Broker::new(64, Duration::from_secs(300)));
    let store = Arc::new(InMemoryCheckpointStore::new());
    let sessions = SessionService::new(store.clone());

    let worker = Worker::new(
        0,
        broker.clone(),
        sessions.clone(),
        registry.clone(),
        RunLimits {
            retry_backoff: Duration::from_millis(1),
            ..RunLimits::default()
        },
        Duration::from_millis(100),
    )
    .expect("complete registry");

    Harness {
        broker,
        sessions,
        store,
        worker,
        llm,
        registry,
    }
}

/// Node names from a run's event stream, in order
pub fn node_sequence(events: &[EventEnvelope]) -> Vec<String> {
    events
        .iter()
        .filter_map(|envelope| {
            let wire = envelope.event.to_wire();
            if wire.get("event").and_then(|e| e.as_str()) == Some("node") {
                wire.get("node")
                    .and_then(|n| n.as_str())
                    .map(str::to_string)
            } else {
                None
            }
        })
        .collect()
}

/// The single terminal event of a run
pub fn terminal(events: &[EventEnvelope]) -> &EventEnvelope {
    let terminals: Vec<&EventEnvelope> = events
        .iter()
        .filter(|envelope| envelope.event.is_terminal())
        .collect();
    assert_eq!(terminals.len(), 1, "exactly one terminal event expected");
    assert!(
        events.last().unwrap().event.is_terminal(),
        "no event may follow the terminal one"
    );
    terminals[0]
}

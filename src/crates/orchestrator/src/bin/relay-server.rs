//! Relay server binary
//!
//! Wires the broker, checkpoint store, tool adapters, worker pool and HTTP
//! API together and serves until ctrl-c or SIGTERM.

use anyhow::Context;
use llm::{OpenAiClient, RemoteLlmConfig};
use orchestrator::api::{create_router, AppState};
use orchestrator::broker::Broker;
use orchestrator::config::ServiceConfig;
use orchestrator::feedback::InMemoryFeedbackStore;
use orchestrator::sessions::SessionService;
use orchestrator::worker::Worker;
use relay_agents::{
    build_registry, CalculatorAdapter, InternalRetrievalAdapter, KeywordRetriever,
    RetrieverBackend, SearchConfig, Summarizer, TargetedCrawlAdapter, ToolRegistry,
    WebSearchAdapter,
};
use relay_checkpoint::InMemoryCheckpointStore;
use relay_core::llm::ChatModel;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tooling::logging::init_tracing("info");

    tracing::info!("Loading service configuration");
    let config = Arc::new(ServiceConfig::load().context("loading configuration")?);
    tracing::info!(
        workers = config.worker_count,
        model = %config.llm_model,
        "Configuration loaded"
    );

    // Language model client. A missing key is not fatal: the server comes up
    // and /health reports the llm backend as needs_configuration.
    let llm_config = match RemoteLlmConfig::from_env("OPENAI_API_KEY") {
        Ok(llm_config) => llm_config,
        Err(e) => {
            tracing::warn!(error = %e, "No LLM API key; runs will fail until configured");
            RemoteLlmConfig::new("")
        }
    };
    let llm: Arc<dyn ChatModel> = Arc::new(
        OpenAiClient::new(llm_config.with_model(config.llm_model.clone()))
            .context("building LLM client")?,
    );

    // Tool adapters.
    let mut tools = ToolRegistry::new(config.adapter_settings());
    tools.register(Arc::new(CalculatorAdapter::new()));
    tools.register(Arc::new(TargetedCrawlAdapter::new()));
    let search_config = match (&config.web_search_endpoint, &config.web_search_key) {
        (Some(endpoint), Some(key)) => Some(SearchConfig {
            endpoint: endpoint.clone(),
            api_key: key.clone(),
        }),
        _ => None,
    };
    tools.register(Arc::new(WebSearchAdapter::new(search_config)));
    tools.register(Arc::new(InternalRetrievalAdapter::new(
        load_retriever(config.retriever_index_path.as_deref())?,
    )));
    let tools = Arc::new(tools);

    // Pipeline wiring.
    let summarizer = Arc::new(Summarizer::new(llm.clone(), config.summarizer_config()));
    let registry = build_registry(llm.clone(), tools.clone(), summarizer, config.node_settings());

    let broker = Arc::new(Broker::new(config.replay_buffer, config.sub_grace));
    let store = Arc::new(InMemoryCheckpointStore::new());
    let sessions = SessionService::new(store);
    let feedback = Arc::new(InMemoryFeedbackStore::new());

    // Worker pool.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut worker_handles = Vec::new();
    for id in 0..config.worker_count {
        let worker = Worker::new(
            id,
            broker.clone(),
            sessions.clone(),
            registry.clone(),
            config.run_limits(),
            config.claim_timeout,
        )
        .context("building worker")?;
        let shutdown = shutdown_rx.clone();
        worker_handles.push(tokio::spawn(async move { worker.run(shutdown).await }));
    }

    let reaper = broker.spawn_reaper(Duration::from_secs(30));

    // HTTP server.
    let state = AppState {
        broker: broker.clone(),
        sessions,
        feedback,
        tools,
        llm,
        config: config.clone(),
    };
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("parsing bind address")?;
    tracing::info!(%addr, "Starting relay server");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain: stop claiming, let in-flight jobs finish.
    tracing::info!("Shutting down workers");
    broker.queue.close();
    let _ = shutdown_tx.send(true);
    for handle in worker_handles {
        let _ = handle.await;
    }
    reaper.abort();

    tracing::info!("Relay server shut down gracefully");
    Ok(())
}

/// Load the internal retriever index when a path is configured
///
/// The index file is JSON lines, one `{"text": ..., "source": ...}` document
/// per line.
fn load_retriever(
    path: Option<&str>,
) -> anyhow::Result<Option<Arc<dyn RetrieverBackend>>> {
    let Some(path) = path else {
        return Ok(None);
    };

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading retriever index {}", path))?;

    let mut retriever = KeywordRetriever::new();
    for (line_number, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let doc: serde_json::Value = serde_json::from_str(line)
            .with_context(|| format!("parsing {} line {}", path, line_number + 1))?;
        let text = doc.get("text").and_then(|v| v.as_str()).unwrap_or_default();
        let source = doc
            .get("source")
            .and_then(|v| v.as_str())
            .unwrap_or("internal");
        if !text.is_empty() {
            retriever.add_document(text, source);
        }
    }

    tracing::info!(documents = retriever.len(), "Loaded retriever index");
    Ok(Some(Arc::new(retriever)))
}

/// Signal for graceful shutdown (ctrl-c or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL-C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received CTRL-C signal, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down");
        }
    }
}

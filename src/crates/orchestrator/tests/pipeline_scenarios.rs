//! End-to-end pipeline scenarios over a scripted language model

mod common;

use common::{harness, node_sequence, terminal};
use orchestrator::broker::Job;
use relay_core::{AgentState, Evidence, Message, PipelineEvent, RunLimits};
use std::time::Duration;

const APPROVED: &str = r#"{"verdict": "approved", "reasons": [], "instructions": ""}"#;
const NEEDS_REVISION: &str =
    r#"{"verdict": "needs_revision", "reasons": ["too thin"], "instructions": "add detail"}"#;

#[tokio::test]
async fn calculator_shortcut_skips_planner_and_retrieval() {
    // Only the critic consults the model on the calculator path.
    let harness = harness(vec![APPROVED], None, None);

    let events = harness
        .run(Job::new("r1", "s1", "What is 15% of 1500?"))
        .await;

    assert_eq!(events[0].event.kind(), "connected");
    assert_eq!(
        node_sequence(&events),
        vec!["router", "generator", "critic", "summarize", "finalize"]
    );

    let wire = terminal(&events).event.to_wire();
    assert_eq!(wire["event"], "complete");
    assert!(wire["state"]["final_answer"].as_str().unwrap().contains("225"));
    assert_eq!(wire["state"]["routing_decision"]["tool"], "calculator");
}

#[tokio::test]
async fn revision_loop_is_bounded_at_two() {
    // route, draft, critique, draft, critique, draft, critique.
    let harness = harness(
        vec![
            r#"{"tool": "direct_answer", "reasoning": "general question"}"#,
            "first draft",
            NEEDS_REVISION,
            "second draft",
            NEEDS_REVISION,
            "third draft",
            APPROVED,
        ],
        None,
        None,
    );

    let events = harness
        .run(Job::new("r2", "s2", "explain ownership in rust"))
        .await;

    let nodes = node_sequence(&events);
    assert_eq!(
        nodes,
        vec![
            "router", "generator", "critic", "generator", "critic", "generator", "critic",
            "summarize", "finalize"
        ]
    );

    let wire = terminal(&events).event.to_wire();
    assert_eq!(wire["state"]["revision_count"], 2);
    assert!(wire["state"]["final_answer"]
        .as_str()
        .unwrap()
        .contains("third draft"));
}

#[tokio::test]
async fn revision_cap_forces_completion_with_last_draft() {
    // The critic never approves; the cap must still terminate the run.
    let harness = harness(
        vec![
            r#"{"tool": "direct_answer", "reasoning": "general question"}"#,
            "draft one",
            NEEDS_REVISION,
            "draft two",
            NEEDS_REVISION,
            "draft three",
            NEEDS_REVISION,
        ],
        None,
        None,
    );

    let events = harness.run(Job::new("r3", "s3", "a hard question")).await;

    let wire = terminal(&events).event.to_wire();
    assert_eq!(wire["event"], "complete");
    assert_eq!(wire["state"]["revision_count"], 2);
    assert!(wire["state"]["final_answer"]
        .as_str()
        .unwrap()
        .contains("draft three"));
}

#[tokio::test]
async fn empty_internal_retrieval_falls_back_to_web_search() {
    // Internal index is configured but empty; web search returns evidence.
    let harness = harness(
        vec![
            r#"{"intent": "look up the document", "plan": ["search", "answer"]}"#,
            "According to the search results [1], caching is write-through.",
            APPROVED,
        ],
        Some(vec![Evidence::new(
            "caching is write-through",
            "https://example.com/caching",
        )]),
        Some(relay_agents::KeywordRetriever::new()),
    );

    let events = harness
        .run(Job::new(
            "r4",
            "s4",
            "what does the design document say about caching",
        ))
        .await;

    assert_eq!(
        node_sequence(&events),
        vec![
            "router", "planner", "retrieval", "generator", "critic", "summarize", "finalize"
        ]
    );

    // The routing decision visible at completion reflects the fallback.
    let wire = terminal(&events).event.to_wire();
    assert_eq!(wire["state"]["routing_decision"]["tool"], "web_search");
    assert!(wire["state"]["routing_decision"]["reasoning"]
        .as_str()
        .unwrap()
        .contains("fell back"));
}

#[tokio::test]
async fn rejected_draft_completes_with_sanitized_answer() {
    let harness = harness(
        vec![
            r#"{"tool": "direct_answer", "reasoning": "general question"}"#,
            "an unsafe draft",
            r#"{"verdict": "rejected", "reasons": ["policy"], "instructions": ""}"#,
        ],
        None,
        None,
    );

    let events = harness.run(Job::new("r5", "s5", "do something unsafe")).await;

    let wire = terminal(&events).event.to_wire();
    assert_eq!(wire["event"], "complete");
    let answer = wire["state"]["final_answer"].as_str().unwrap();
    assert!(!answer.contains("unsafe draft"));
    assert!(answer.contains("can't help"));
}

#[tokio::test]
async fn completed_run_appends_both_turn_messages() {
    let harness = harness(vec![APPROVED], None, None);
    harness.run(Job::new("r6", "s6", "What is 2 + 2?")).await;

    let history = harness.sessions.get_history("s6").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "What is 2 + 2?");
    assert!(history[1].content.contains("4"));

    // A second turn stacks on top of the first.
    harness.llm.push(APPROVED);
    harness.run(Job::new("r7", "s6", "What is 3 + 3?")).await;
    let history = harness.sessions.get_history("s6").await.unwrap();
    assert_eq!(history.len(), 4);
}

#[tokio::test]
async fn hierarchical_summary_runs_chunked_passes() {
    let harness = harness(
        vec![
            r#"{"tool": "direct_answer", "reasoning": "general question"}"#,
            "a draft",
            APPROVED,
        ],
        None,
        None,
    );

    // Seed a session with 120 user/assistant pairs.
    let mut seeded = AgentState::new("seed", "en");
    for i in 0..120 {
        seeded.chat_history.push(Message::user(format!("q{}", i)));
        seeded.chat_history.push(Message::assistant(format!("a{}", i)));
    }
    harness.sessions.save_state("s8", &seeded).await.unwrap();

    let events = harness.run(Job::new("r8", "s8", "one more question")).await;

    let wire = terminal(&events).event.to_wire();
    assert_eq!(wire["event"], "complete");

    // 240 prior messages → prefix of 236 → 12 chunk passes plus the meta
    // pass, on top of the route/draft/critique calls.
    assert_eq!(harness.llm.call_count(), 3 + 12 + 1);

    let summary = wire["state"]["summary"].as_str().unwrap();
    assert!(!summary.is_empty());
    assert!(summary.chars().count() <= 4096);
}

#[tokio::test]
async fn job_deadline_completes_with_best_available_answer() {
    // A spent deadline is a budget outcome, not a failure: the run must end
    // in a `complete` event carrying the stub (no draft was produced yet).
    let fixture = harness(vec![], None, None);
    let worker = fixture.worker_with_limits(
        9,
        RunLimits {
            job_deadline: Duration::ZERO,
            retry_backoff: Duration::from_millis(1),
            ..RunLimits::default()
        },
    );

    fixture.broker.events.open("r11");
    worker
        .process(Job::new("r11", "s11", "a slow question"))
        .await;

    let events = fixture.broker.events.subscribe("r11").unwrap().backlog;
    let wire = terminal(&events).event.to_wire();
    assert_eq!(wire["event"], "complete");
    assert!(wire["state"]["final_answer"]
        .as_str()
        .unwrap()
        .contains("wasn't able to produce an answer"));

    // The closed-out run still records the turn like any completed one.
    let history = fixture.sessions.get_history("s11").await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[1].content.contains("wasn't able to produce an answer"));
}

#[tokio::test]
async fn run_error_emits_single_terminal_error_without_history_pollution() {
    // Script exhaustion with no fallback makes the router's LLM call fail.
    let harness = harness(vec![], None, None);
    harness.llm.set_fallback(None);

    let events = harness
        .run(Job::new("r9", "s9", "an open-ended question"))
        .await;

    let wire = terminal(&events).event.to_wire();
    assert_eq!(wire["event"], "error");
    assert!(wire.get("stage").is_some());

    // The failed run must not append messages to the session.
    let history = harness.sessions.get_history("s9").await.unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn events_are_ordered_and_monotonically_sequenced() {
    let harness = harness(vec![APPROVED], None, None);
    let events = harness.run(Job::new("r10", "s10", "What is 10 * 10?")).await;

    for pair in events.windows(2) {
        assert!(pair[0].sequence < pair[1].sequence);
        assert!(pair[0].published_at <= pair[1].published_at);
    }

    // First event is connected, before any node event.
    assert!(matches!(events[0].event, PipelineEvent::Connected));
}

//! Chat service routing: start, confirm, cancel, duplicate starts.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{MockProvider, RecordingSink};
use parley::broadcast::CONFIRM_TOKEN;
use parley::config::ParleyConfig;
use parley::orchestrator::{Orchestrator, RunStatus};
use parley::service::ChatService;
use parley::substrate::InProcess;
use parley::tools::{FnTool, ToolParameters, ToolRegistry};
use parley::types::{ChatMessage, ConfirmRequest, StartRequest};
use pretty_assertions::assert_eq;
use serde_json::json;

struct Fixture {
    provider: Arc<MockProvider>,
    sink: Arc<RecordingSink>,
    service: ChatService,
    delete_invocations: Arc<AtomicUsize>,
}

fn fixture() -> Fixture {
    let provider = Arc::new(MockProvider::new());
    let sink = Arc::new(RecordingSink::new());
    let substrate = Arc::new(InProcess::new());
    let delete_invocations = Arc::new(AtomicUsize::new(0));

    let counter = delete_invocations.clone();
    let delete = FnTool::new(
        "delete_issue",
        "Delete an issue by ID",
        ToolParameters::object()
            .string("id", "ID of the issue to delete", true)
            .build(),
        move |_call, _history| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(json!(true))
            }
        },
    )
    .confirmed();

    let registry = Arc::new(ToolRegistry::new().with(Arc::new(delete)));
    let orchestrator = Orchestrator::new(
        provider.clone(),
        registry,
        sink.clone(),
        substrate.clone(),
        ParleyConfig::default(),
    );
    let service = ChatService::new(orchestrator, substrate.bus());

    Fixture {
        provider,
        sink,
        service,
        delete_invocations,
    }
}

fn start_request(request_id: Option<&str>) -> StartRequest {
    StartRequest {
        messages: vec![ChatMessage::user("delete the login issue")],
        request_id: request_id.map(Into::into),
    }
}

async fn wait_for_gate(sink: &RecordingSink) {
    while !sink.contains(CONFIRM_TOKEN) {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

#[tokio::test(start_paused = true)]
async fn start_generates_a_request_id_when_missing() {
    let f = fixture();
    f.provider.queue_text(&["Nothing to delete."]);

    let request_id = f.service.start(start_request(None)).await;
    assert!(!request_id.as_str().is_empty());

    let outcome = f.service.wait(&request_id).await.unwrap();
    assert_eq!(outcome.status, RunStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn confirm_resolves_a_waiting_gate() {
    let f = fixture();
    f.provider.queue_call("delete_issue", r#"{"id":"LIN-1"}"#);
    f.provider.queue_text(&["Deleted."]);

    let request_id = f.service.start(start_request(Some("svc-approve"))).await;
    wait_for_gate(&f.sink).await;

    assert!(f.service.confirm(ConfirmRequest {
        request_id: request_id.clone(),
        confirm: true,
    }));

    let outcome = f.service.wait(&request_id).await.unwrap();
    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.messages.len(), 4);
    assert_eq!(f.delete_invocations.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn confirm_without_a_waiting_gate_is_a_no_op() {
    let f = fixture();
    assert!(!f.service.confirm(ConfirmRequest {
        request_id: "nobody-home".into(),
        confirm: true,
    }));
}

#[tokio::test(start_paused = true)]
async fn cancel_aborts_a_tracked_run() {
    let f = fixture();
    f.provider.queue_call("delete_issue", r#"{"id":"LIN-1"}"#);

    let request_id = f.service.start(start_request(Some("svc-cancel"))).await;
    wait_for_gate(&f.sink).await;

    assert!(f.service.cancel(&request_id).await);
    // The slot is released; a second cancel finds nothing.
    assert!(!f.service.cancel(&request_id).await);
    assert_eq!(f.delete_invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn duplicate_start_aborts_the_previous_run() {
    let f = fixture();
    // First run parks on its confirmation gate.
    f.provider.queue_call("delete_issue", r#"{"id":"LIN-1"}"#);

    let first_id = f.service.start(start_request(Some("svc-dup"))).await;
    wait_for_gate(&f.sink).await;

    // Second run with the same id supersedes it.
    f.provider.queue_text(&["Fresh start."]);
    let second_id = f.service.start(start_request(Some("svc-dup"))).await;
    assert_eq!(first_id, second_id);

    let outcome = f.service.wait(&second_id).await.unwrap();
    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.messages.len(), 2);
    // The superseded run never got to invoke its tool.
    assert_eq!(f.delete_invocations.load(Ordering::SeqCst), 0);
}

//! Tool trait and parameter builder tests.

use std::sync::Arc;

use parley::tools::{FnTool, Tool, ToolParameters, ToolRegistry};
use parley::types::{ChatMessage, ParsedCall};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn parameter_builder_shapes_the_schema() {
    let params = ToolParameters::object()
        .string("search", "The search term", true)
        .number("limit", "Max results", false)
        .boolean("archived", "Include archived", false)
        .build();

    let schema = &params.schema;
    assert_eq!(schema["type"], "object");
    assert_eq!(schema["properties"]["search"]["type"], "string");
    assert_eq!(schema["properties"]["limit"]["type"], "number");
    assert_eq!(schema["properties"]["archived"]["type"], "boolean");
    assert_eq!(schema["required"], json!(["search"]));
}

#[test]
fn empty_parameters_accept_no_required_fields() {
    let params = ToolParameters::empty();
    assert_eq!(params.schema["required"], json!([]));
}

#[test]
fn confirmed_toggles_the_gate_flag() {
    let plain = FnTool::new(
        "search_issues",
        "Search",
        ToolParameters::empty(),
        |_call, _history| async move { Ok(json!(null)) },
    );
    let gated = FnTool::new(
        "delete_issue",
        "Delete",
        ToolParameters::empty(),
        |_call, _history| async move { Ok(json!(null)) },
    )
    .confirmed();

    assert!(!plain.requires_confirmation());
    assert!(gated.requires_confirmation());
}

#[tokio::test]
async fn handler_sees_arguments_and_history() {
    let tool = FnTool::new(
        "summarize",
        "Summarize the conversation",
        ToolParameters::empty(),
        |call, history| async move {
            Ok(json!({
                "topic": call.arguments["topic"],
                "messages_seen": history.len(),
            }))
        },
    );

    let call = ParsedCall {
        name: "summarize".into(),
        arguments: json!({"topic": "login"}),
    };
    let history = vec![ChatMessage::user("one"), ChatMessage::assistant("two")];

    let result = tool.invoke(&call, &history).await.unwrap();
    assert_eq!(result["topic"], "login");
    assert_eq!(result["messages_seen"], 2);
}

#[tokio::test]
async fn registry_invokes_each_call_once() {
    let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let seen = counter.clone();
    let tool = FnTool::new(
        "tick",
        "Count invocations",
        ToolParameters::empty(),
        move |_call, _history| {
            let seen = seen.clone();
            async move {
                Ok(json!(seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1))
            }
        },
    );

    let registry = ToolRegistry::new().with(Arc::new(tool));
    let call = ParsedCall {
        name: "tick".into(),
        arguments: json!({}),
    };

    let first = registry.invoke(&call, &[]).await.unwrap();
    assert_eq!(first, json!(1));
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 1);
}

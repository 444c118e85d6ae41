//! Anthropic provider against a mock Messages API.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use board_service::interpreter::{CommandInterpreter, DelegatedInterpreter};
use board_service::llm::{AnthropicProvider, LlmError, LlmProvider, ANTHROPIC_VERSION};
use board_service::models::{AuthorSelection, ChartKind, Operation};
use common::fast_policy;

fn messages_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn"
    }))
}

fn provider(server: &MockServer) -> AnthropicProvider {
    AnthropicProvider::new("sk-test", "test-model", &server.uri()).unwrap()
}

#[tokio::test]
async fn sends_credential_version_and_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test"))
        .and(header("anthropic-version", ANTHROPIC_VERSION))
        .and(body_partial_json(json!({"model": "test-model", "max_tokens": 500})))
        .respond_with(messages_reply("hello"))
        .expect(1)
        .mount(&server)
        .await;

    let reply = provider(&server).complete("hi", 500).await.unwrap();
    assert_eq!(reply, "hello");
}

#[tokio::test]
async fn error_statuses_and_empty_replies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    match provider(&server).complete("hi", 10).await {
        Err(LlmError::Status { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad key");
        }
        other => panic!("expected status error, got {:?}", other),
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
        .mount(&server)
        .await;
    assert!(matches!(
        provider(&server).complete("hi", 10).await,
        Err(LlmError::EmptyReply)
    ));
}

#[tokio::test]
async fn fenced_json_reply_drives_the_interpreter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(messages_reply(
            "Here you go:\n```json\n{\"operation\": \"chart\", \"authors\": [\"hong\", \"kim\"], \"chart_kind\": \"donut\", \"confidence\": 0.92}\n```",
        ))
        .mount(&server)
        .await;

    let interpreter = DelegatedInterpreter::new(Arc::new(provider(&server)), fast_policy(0), 500);
    let cmd = interpreter.interpret("compare them").await;

    assert_eq!(cmd.operation, Operation::Chart);
    assert_eq!(
        cmd.authors,
        AuthorSelection::Many(vec!["hong".to_string(), "kim".to_string()])
    );
    assert_eq!(cmd.chart_kind, ChartKind::Donut);
}

#[tokio::test]
async fn server_errors_are_retried_then_fall_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
        .expect(2)
        .mount(&server)
        .await;

    let interpreter = DelegatedInterpreter::new(Arc::new(provider(&server)), fast_policy(1), 500);
    let cmd = interpreter.interpret("hong's data as a pie chart").await;

    assert!(cmd.valid);
    assert_eq!(cmd.authors, AuthorSelection::Single("hong".to_string()));
    assert_eq!(cmd.chart_kind, ChartKind::Pie);
}

#[tokio::test]
async fn slow_service_times_out_and_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(messages_reply("{}").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let interpreter = DelegatedInterpreter::new(Arc::new(provider(&server)), fast_policy(0), 500);
    let started = std::time::Instant::now();
    let cmd = interpreter.interpret("kim's data as line chart").await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(cmd.authors, AuthorSelection::Single("kim".to_string()));
    assert_eq!(cmd.chart_kind, ChartKind::Line);
}

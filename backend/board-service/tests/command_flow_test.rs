//! End-to-end command flows over the in-memory store.

mod common;

use std::sync::Arc;

use board_service::error::BoardError;
use board_service::interpreter::{CommandInterpreter, PatternInterpreter};
use board_service::models::{ChartKind, NewPost};
use board_service::services::ChartEnvelope;
use common::{board, delegated, hong_and_kim, seeded_store, FailingProvider, ScriptedProvider, SlowProvider};

#[tokio::test]
async fn single_value_bar_chart() {
    let store = seeded_store(vec![NewPost::new("hong", "only").with_value(150.0)]).await;
    let board = board(store, Arc::new(PatternInterpreter::new()));

    let outcome = board
        .chart_from_command("hong's data as bar chart")
        .await
        .unwrap();

    assert_eq!(outcome.chart_spec.kind, ChartKind::Bar);
    assert_eq!(outcome.data_point_count, 1);
    assert_eq!(outcome.chart_spec.data.labels.len(), 1);
    assert_eq!(outcome.chart_spec.data.datasets[0].data, vec![150.0]);
}

#[tokio::test]
async fn command_without_author_reports_missing_author() {
    let store = seeded_store(hong_and_kim()).await;
    let board = board(store, Arc::new(PatternInterpreter::new()));

    let err = board.chart_from_command("show me a chart").await.unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, BoardError::InputUnparseable { .. }));
    assert!(message.contains("author"));
    assert!(message.contains("Available authors: hong, kim"));
}

#[tokio::test]
async fn unknown_author_is_never_a_crash() {
    let store = seeded_store(hong_and_kim()).await;
    let board = board(store, Arc::new(PatternInterpreter::new()));

    for name in ["park", "choi", "nobody"] {
        let err = board
            .chart_from_command(&format!("{}'s data as a line chart", name))
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::AuthorNotFound { .. }), "{name}");
    }
}

#[tokio::test]
async fn multi_author_comparison() {
    let store = seeded_store(hong_and_kim()).await;
    let board = board(store, Arc::new(PatternInterpreter::new()));

    let outcome = board
        .chart_from_command("hong and kim data as bar chart")
        .await
        .unwrap();
    assert_eq!(outcome.authors, vec!["hong", "kim"]);
    assert_eq!(outcome.chart_spec.data.datasets.len(), 2);
    assert!(outcome.chart_spec.options.plugins.legend.display);
}

#[tokio::test]
async fn colours_are_stable_across_calls() {
    let store = seeded_store(hong_and_kim()).await;
    let board = board(store, Arc::new(PatternInterpreter::new()));

    let first = board.chart_from_command("hong and kim data as line chart").await.unwrap();
    let second = board.chart_from_command("hong and kim data as line chart").await.unwrap();
    assert_eq!(first.chart_spec, second.chart_spec);
}

#[tokio::test]
async fn remote_answer_is_used_when_available() {
    let provider = ScriptedProvider::new(&[
        r#"{"operation": "chart", "authors": ["kim"], "chart_kind": "pie", "confidence": 0.9}"#,
    ]);
    let store = seeded_store(hong_and_kim()).await;
    let board = board(store, delegated(provider.clone()));

    let outcome = board
        .chart_from_command("the user numbers please")
        .await
        .unwrap();
    assert_eq!(outcome.authors, vec!["kim"]);
    assert_eq!(outcome.chart_spec.kind, ChartKind::Pie);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn failed_remote_calls_produce_the_same_envelope_shape() {
    let command = "hong's data as bar chart";

    let pattern_board = board(
        seeded_store(hong_and_kim()).await,
        Arc::new(PatternInterpreter::new()),
    );
    let failing = Arc::new(FailingProvider::default());
    let failing_board = board(seeded_store(hong_and_kim()).await, delegated(failing.clone()));
    let slow = Arc::new(SlowProvider::default());
    let slow_board = board(seeded_store(hong_and_kim()).await, delegated(slow.clone()));

    let expected = serde_json::to_value(ChartEnvelope::from(
        pattern_board.chart_from_command(command).await.unwrap(),
    ))
    .unwrap();

    for candidate in [&failing_board, &slow_board] {
        let envelope = ChartEnvelope::from(candidate.chart_from_command(command).await.unwrap());
        let json = serde_json::to_value(envelope).unwrap();

        let keys = |v: &serde_json::Value| {
            let mut keys: Vec<String> = v.as_object().unwrap().keys().cloned().collect();
            keys.sort();
            keys
        };
        assert_eq!(keys(&json), keys(&expected));
        assert_eq!(json["chart_spec"], expected["chart_spec"]);
        assert_eq!(json["success"], true);
    }

    // first attempt plus one retry
    assert_eq!(failing.calls(), 2);
    assert_eq!(slow.calls(), 2);
}

#[tokio::test]
async fn interpreter_strategies_share_one_contract() {
    let strategies: Vec<Arc<dyn CommandInterpreter>> = vec![
        Arc::new(PatternInterpreter::new()),
        delegated(Arc::new(FailingProvider::default())),
    ];

    for strategy in strategies {
        let cmd = strategy.interpret("홍길동과 김철수의 데이터를 선그래프로").await;
        assert!(cmd.valid, "{}", strategy.name());
        assert!(cmd.is_multi_author());
        assert_eq!(cmd.chart_kind, ChartKind::Line);
    }
}

#[tokio::test]
async fn management_round_trip_by_command() {
    let store = seeded_store(vec![]).await;
    let board = board(store, Arc::new(PatternInterpreter::new()));

    let created = board
        .manage_from_command("add a post by hong titled 'Q1' with value 320")
        .await
        .unwrap();
    let id = created.posts[0].id;

    board
        .manage_from_command(&format!("change the value of post {} to 99.5", id))
        .await
        .unwrap();

    let chart = board.chart_from_command("hong's data").await.unwrap();
    assert_eq!(chart.chart_spec.data.datasets[0].data, vec![99.5]);
    assert_eq!(chart.chart_spec.data.labels, vec!["Q1"]);

    let deleted = board
        .manage_from_command("remove hong's posts")
        .await
        .unwrap();
    assert_eq!(deleted.affected, 1);
}

//! Shared fixtures for board-service integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use board_service::activity::ActivityLog;
use board_service::db::{InMemoryPostStore, PostStore};
use board_service::handlers::AppState;
use board_service::interpreter::{CommandInterpreter, DelegatedInterpreter, InterpreterSwitch};
use board_service::llm::{CallPolicy, LlmError, LlmProvider, RetryConfig};
use board_service::models::NewPost;
use board_service::services::{BoardService, PostService};

/// Replies with canned text, in order; errors once the script runs out.
pub struct ScriptedProvider {
    replies: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(LlmError::EmptyReply);
        }
        Ok(replies.remove(0))
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

/// Always fails with a transport error.
#[derive(Default)]
pub struct FailingProvider {
    calls: AtomicUsize,
}

impl FailingProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for FailingProvider {
    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LlmError::Transport("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }

    fn model(&self) -> &str {
        "failing-model"
    }
}

/// Never answers within any reasonable timeout.
#[derive(Default)]
pub struct SlowProvider {
    calls: AtomicUsize,
}

impl SlowProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for SlowProvider {
    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("{}".to_string())
    }

    fn name(&self) -> &str {
        "slow"
    }

    fn model(&self) -> &str {
        "slow-model"
    }
}

/// Short timeouts and no jitter so fallback paths run quickly.
pub fn fast_policy(max_retries: u32) -> CallPolicy {
    CallPolicy {
        attempt_timeout: Duration::from_millis(100),
        retry: RetryConfig {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            jitter: false,
            ..Default::default()
        },
    }
}

pub fn delegated(provider: Arc<dyn LlmProvider>) -> Arc<DelegatedInterpreter> {
    Arc::new(DelegatedInterpreter::new(provider, fast_policy(1), 500))
}

pub async fn seeded_store(posts: Vec<NewPost>) -> Arc<dyn PostStore> {
    let store: Arc<dyn PostStore> = Arc::new(InMemoryPostStore::new());
    for post in posts {
        store.create(post).await.unwrap();
    }
    store
}

pub fn board(store: Arc<dyn PostStore>, interpreter: Arc<dyn CommandInterpreter>) -> BoardService {
    BoardService::new(
        PostService::new(store),
        interpreter,
        Arc::new(ActivityLog::default()),
    )
}

/// In-memory application state using the pattern strategy.
pub async fn app_state(posts: Vec<NewPost>) -> AppState {
    let store = seeded_store(posts).await;
    let activity = Arc::new(ActivityLog::new(50));
    let interpreter = Arc::new(InterpreterSwitch::pattern_only(activity.clone()));
    let board = BoardService::new(PostService::new(store), interpreter.clone(), activity.clone());
    AppState::new(board, interpreter, activity)
}

pub fn hong_and_kim() -> Vec<NewPost> {
    vec![
        NewPost::new("hong", "jan").with_value(150.0),
        NewPost::new("hong", "feb").with_value(180.0),
        NewPost::new("kim", "users").with_value(40.0),
        NewPost::new("lee", "notes"),
    ]
}

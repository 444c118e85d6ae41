/// Interpretation delegated to a remote language model.
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use super::patterns::PatternInterpreter;
use super::CommandInterpreter;
use crate::activity::{ActivityCategory, ActivityEntry, ActivityLevel, ActivityLog};
use crate::llm::{CallPolicy, LlmError, LlmProvider};
use crate::metrics::{self, REMOTE_CALL_DURATION_SECONDS};
use crate::models::{AuthorSelection, ChartKind, Operation, ParsedCommand, PostFields};

const INSTRUCTIONS: &str = r#"You interpret commands for a bulletin board of posts. Posts have an author, a title, optional content, an optional numeric value and an optional category. Commands may be Korean or English.

Reply with a single JSON object and nothing else:
{
  "operation": "chart" | "create" | "update" | "delete" | "list",
  "authors": ["name", ...] or null,
  "all_authors": true | false,
  "chart_kind": "bar" | "line" | "pie" | "doughnut",
  "post_id": number or null,
  "author": string or null,
  "title": string or null,
  "content": string or null,
  "numeric_value": number or null,
  "category": string or null,
  "valid": true | false,
  "confidence": 0.0-1.0,
  "explanation": "short reason"
}

Chart kinds: 막대, 바, 막대그래프, bar -> "bar"; 선그래프, 라인, 선형, 꺾은선, line -> "line"; 원그래프, 파이, 원형, pie -> "pie"; 도넛, 도너츠, donut -> "doughnut". Default to "bar".

Authors: "홍길동의 데이터" or "hong's data" -> ["홍길동"] / ["hong"]. "홍길동과 김철수", "hong and kim" -> both names. "모든 사람들", "전체", "모두", "everyone", "all authors" -> all_authors true.

Examples:
"홍길동으로 새 게시글 작성해줘. 제목은 '4월 매출', 수치값은 250.5" -> operation "create", author "홍길동", title "4월 매출", numeric_value 250.5
"1번 게시글 제목을 '새 제목'으로 바꿔줘" -> operation "update", post_id 1, title "새 제목"
"2번 게시글 삭제해줘" -> operation "delete", post_id 2
"홍길동의 모든 게시글 삭제해줘" -> operation "delete", authors ["홍길동"]
"게시글 목록 보여줘" -> operation "list"

If the command names no author for a chart, or cannot be understood, set "valid" to false."#;

fn build_prompt(text: &str) -> String {
    format!("{}\n\nCommand: \"{}\"", INSTRUCTIONS, text)
}

/// Pull the JSON object out of a reply that may wrap it in a code fence or prose.
pub fn extract_json(reply: &str) -> Option<&str> {
    let fenced = reply
        .split_once("```json")
        .or_else(|| reply.split_once("```"))
        .and_then(|(_, rest)| rest.split_once("```").map(|(body, _)| body.trim()))
        .filter(|body| body.starts_with('{'));
    if fenced.is_some() {
        return fenced;
    }

    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

#[derive(Debug, Deserialize)]
struct RemoteCommand {
    #[serde(default, alias = "action")]
    operation: String,
    #[serde(default, alias = "author_names")]
    authors: Option<Vec<String>>,
    #[serde(default)]
    all_authors: bool,
    #[serde(default, alias = "chart_type")]
    chart_kind: Option<String>,
    #[serde(default)]
    post_id: Option<i64>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    numeric_value: Option<f64>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default = "default_valid")]
    valid: bool,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    explanation: Option<String>,
}

fn default_valid() -> bool {
    true
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl RemoteCommand {
    /// Convert and check the reply. `Err` carries the reason it is unusable.
    fn into_command(self, original: &str) -> Result<ParsedCommand, String> {
        if !self.valid {
            return Err(self
                .explanation
                .unwrap_or_else(|| "remote interpreter marked the command invalid".to_string()));
        }

        let operation = Operation::parse(&self.operation);
        let mut names: Vec<String> = Vec::new();
        for name in self.authors.unwrap_or_default() {
            let name = name.trim().to_string();
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        let author = non_blank(self.author);

        let authors = if self.all_authors {
            AuthorSelection::All
        } else if names.is_empty() {
            author
                .clone()
                .map(AuthorSelection::Single)
                .unwrap_or_default()
        } else {
            AuthorSelection::from_names(names)
        };

        let fields = PostFields {
            author,
            title: non_blank(self.title),
            content: non_blank(self.content),
            numeric_value: self.numeric_value.filter(|v| v.is_finite()),
            category: non_blank(self.category),
        };

        match operation {
            Operation::Unknown => return Err(format!("unknown operation '{}'", self.operation)),
            Operation::Chart if authors.is_none() => {
                return Err("chart command without an author".to_string())
            }
            Operation::Update if self.post_id.is_none() => {
                return Err("update command without a post id".to_string())
            }
            Operation::Update if fields.is_empty() => {
                return Err("update command without fields".to_string())
            }
            Operation::Delete if self.post_id.is_none() && authors.single().is_none() => {
                return Err("delete command without a post id or author".to_string())
            }
            Operation::Create if fields.title.is_none() || authors.single().is_none() => {
                return Err("create command needs a title and an author".to_string())
            }
            _ => {}
        }

        let mut fields = fields;
        if operation == Operation::Create && fields.author.is_none() {
            fields.author = authors.single().map(str::to_string);
        }

        let mut command = ParsedCommand::new(original, operation);
        command.authors = authors;
        command.chart_kind = self
            .chart_kind
            .as_deref()
            .map(ChartKind::coerce)
            .unwrap_or_default();
        command.post_id = self.post_id;
        command.fields = fields;
        command.confidence = self.confidence.unwrap_or(0.9).clamp(0.0, 1.0);
        Ok(command)
    }
}

/// Failure modes of a single delegated attempt, before fallback.
#[derive(Debug)]
enum Rejection {
    Call(LlmError),
    Unusable(String),
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Call(e) => write!(f, "{}", e),
            Rejection::Unusable(reason) => write!(f, "unusable reply: {}", reason),
        }
    }
}

pub struct DelegatedInterpreter {
    provider: Arc<dyn LlmProvider>,
    fallback: PatternInterpreter,
    policy: CallPolicy,
    max_tokens: u32,
    activity: Option<Arc<ActivityLog>>,
}

impl DelegatedInterpreter {
    pub fn new(provider: Arc<dyn LlmProvider>, policy: CallPolicy, max_tokens: u32) -> Self {
        Self {
            provider,
            fallback: PatternInterpreter::new(),
            policy,
            max_tokens,
            activity: None,
        }
    }

    pub fn with_activity(mut self, activity: Arc<ActivityLog>) -> Self {
        self.activity = Some(activity);
        self
    }

    async fn ask_remote(&self, text: &str) -> Result<ParsedCommand, Rejection> {
        let prompt = build_prompt(text);
        let provider = &self.provider;
        let prompt_ref = prompt.as_str();
        let max_tokens = self.max_tokens;

        let started = Instant::now();
        let reply = self
            .policy
            .run(move || provider.complete(prompt_ref, max_tokens))
            .await;
        let outcome = match &reply {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        REMOTE_CALL_DURATION_SECONDS
            .with_label_values(&[outcome])
            .observe(started.elapsed().as_secs_f64());

        let reply = reply.map_err(Rejection::Call)?;
        debug!(reply_len = reply.len(), "remote interpretation received");

        let json = extract_json(&reply)
            .ok_or_else(|| Rejection::Unusable("no JSON object in reply".to_string()))?;
        let remote: RemoteCommand = serde_json::from_str(json)
            .map_err(|e| Rejection::Call(LlmError::MalformedReply(e.to_string())))?;
        remote.into_command(text).map_err(Rejection::Unusable)
    }

    fn record(&self, entry: ActivityEntry) {
        if let Some(activity) = &self.activity {
            activity.record(entry);
        }
    }
}

#[async_trait]
impl CommandInterpreter for DelegatedInterpreter {
    async fn interpret(&self, text: &str) -> ParsedCommand {
        if text.trim().is_empty() {
            return self.fallback.interpret(text).await;
        }

        let started = Instant::now();
        match self.ask_remote(text).await {
            Ok(command) => {
                metrics::record_interpretation(self.name(), "answered");
                self.record(
                    ActivityEntry::new(
                        ActivityLevel::Success,
                        ActivityCategory::Interpret,
                        format!("remote interpretation: {}", command.operation),
                    )
                    .with_details(serde_json::json!({
                        "command": text,
                        "model": self.provider.model(),
                        "confidence": command.confidence,
                    }))
                    .with_duration(started.elapsed()),
                );
                command
            }
            Err(rejection) => {
                warn!(
                    provider = self.provider.name(),
                    error = %rejection,
                    "remote interpretation failed, falling back to patterns"
                );
                metrics::record_interpretation(self.name(), "fallback");
                self.record(
                    ActivityEntry::new(
                        ActivityLevel::Warning,
                        ActivityCategory::Interpret,
                        "remote interpretation failed, pattern fallback used",
                    )
                    .with_details(serde_json::json!({
                        "command": text,
                        "error": rejection.to_string(),
                    }))
                    .with_duration(started.elapsed()),
                );
                self.fallback.interpret(text).await
            }
        }
    }

    fn name(&self) -> &str {
        "delegated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    struct CannedProvider {
        replies: Mutex<Vec<Result<String, LlmError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedProvider {
        fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                Err(LlmError::EmptyReply)
            } else {
                replies.remove(0)
            }
        }

        fn name(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "canned-model"
        }
    }

    fn interpreter(provider: Arc<CannedProvider>) -> DelegatedInterpreter {
        let policy = CallPolicy {
            attempt_timeout: Duration::from_millis(200),
            retry: crate::llm::RetryConfig {
                max_retries: 1,
                initial_backoff: Duration::from_millis(1),
                jitter: false,
                ..Default::default()
            },
        };
        DelegatedInterpreter::new(provider, policy, 500)
    }

    #[test]
    fn json_is_found_in_fences_and_prose() {
        assert_eq!(
            extract_json("```json\n{\"a\": 1}\n```"),
            Some("{\"a\": 1}")
        );
        assert_eq!(extract_json("```\n{\"a\": 1}\n```"), Some("{\"a\": 1}"));
        assert_eq!(
            extract_json("Sure! {\"a\": {\"b\": 2}} hope that helps"),
            Some("{\"a\": {\"b\": 2}}")
        );
        assert_eq!(extract_json("no json here"), None);
    }

    #[tokio::test]
    async fn remote_chart_answer_is_used() {
        let provider = CannedProvider::new(vec![Ok(r#"```json
{"operation": "chart", "authors": ["홍길동", "김철수"], "chart_kind": "line", "valid": true, "confidence": 0.95}
```"#
            .to_string())]);
        let cmd = interpreter(provider.clone())
            .interpret("홍길동과 김철수 비교")
            .await;

        assert_eq!(cmd.operation, Operation::Chart);
        assert_eq!(
            cmd.authors,
            AuthorSelection::Many(vec!["홍길동".to_string(), "김철수".to_string()])
        );
        assert_eq!(cmd.chart_kind, ChartKind::Line);
        assert!((cmd.confidence - 0.95).abs() < f32::EPSILON);
        assert_eq!(provider.calls(), 1);
        assert!(provider.prompts.lock().unwrap()[0].contains("홍길동과 김철수 비교"));
    }

    #[tokio::test]
    async fn all_authors_and_unknown_kind() {
        let provider = CannedProvider::new(vec![Ok(
            r#"{"operation": "chart", "all_authors": true, "chart_kind": "radar"}"#.to_string(),
        )]);
        let cmd = interpreter(provider).interpret("everyone please").await;
        assert_eq!(cmd.authors, AuthorSelection::All);
        assert_eq!(cmd.chart_kind, ChartKind::Bar);
    }

    #[tokio::test]
    async fn create_takes_author_from_names() {
        let provider = CannedProvider::new(vec![Ok(
            r#"{"operation": "create", "authors": ["홍길동"], "title": "4월 매출", "numeric_value": 250.5}"#
                .to_string(),
        )]);
        let cmd = interpreter(provider).interpret("홍길동으로 새 게시글").await;
        assert_eq!(cmd.operation, Operation::Create);
        assert_eq!(cmd.fields.author.as_deref(), Some("홍길동"));
        assert_eq!(cmd.fields.numeric_value, Some(250.5));
    }

    #[tokio::test]
    async fn transport_failure_falls_back_to_patterns() {
        let provider = CannedProvider::new(vec![
            Err(LlmError::Transport("reset".into())),
            Err(LlmError::Transport("reset".into())),
        ]);
        let activity = Arc::new(ActivityLog::default());
        let cmd = interpreter(provider.clone())
            .with_activity(activity.clone())
            .interpret("hong's data as bar chart")
            .await;

        assert!(cmd.valid);
        assert_eq!(cmd.authors, AuthorSelection::Single("hong".to_string()));
        assert_eq!(provider.calls(), 2);
        let entries = activity.recent(None);
        assert_eq!(entries.last().unwrap().level, ActivityLevel::Warning);
    }

    #[tokio::test]
    async fn unusable_replies_fall_back_without_retry() {
        for reply in [
            "I cannot help with that",
            r#"{"operation": "chart", "valid": true}"#,
            r#"{"operation": "update", "title": "x"}"#,
            r#"{"operation": "chart", "authors": ["hong"], "valid": false}"#,
            r#"{"operation": 42}"#,
        ] {
            let provider = CannedProvider::new(vec![Ok(reply.to_string())]);
            let cmd = interpreter(provider.clone())
                .interpret("홍길동의 데이터를 파이로")
                .await;
            assert_eq!(provider.calls(), 1, "{reply}");
            assert_eq!(cmd.authors, AuthorSelection::Single("홍길동".to_string()));
            assert_eq!(cmd.chart_kind, ChartKind::Pie);
            assert!((cmd.confidence - 0.6).abs() < f32::EPSILON);
        }
    }
}

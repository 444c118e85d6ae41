/// Board service - turns free-text commands into charts and post changes
///
/// Chart flow: interpret → resolve authors → load each author's numeric
/// posts (oldest first) → assemble. Management flow: interpret → branch on
/// the operation → post service.
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::activity::{ActivityCategory, ActivityEntry, ActivityLevel, ActivityLog};
use crate::chart::{self, AuthorSeries, ChartError, ChartSpec, ChartSummary};
use crate::error::BoardError;
use crate::interpreter::CommandInterpreter;
use crate::metrics::{self, CHART_POINTS};
use crate::models::{AuthorSelection, ChartKind, Operation, ParsedCommand, Post};

use super::PostService;

#[derive(Debug, Clone, Serialize)]
pub struct ChartOutcome {
    pub message: String,
    pub chart_spec: ChartSpec,
    /// Values plotted in `chart_spec`; `summary` counts the posts behind them
    pub data_point_count: usize,
    pub summary: Option<ChartSummary>,
    /// Authors that contributed data, in request order
    pub authors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManageOutcome {
    pub operation: Operation,
    pub message: String,
    pub posts: Vec<Post>,
    pub affected: u64,
}

/// Response body for chart commands. Every field is always present.
#[derive(Debug, Clone, Serialize)]
pub struct ChartEnvelope {
    pub success: bool,
    pub message: String,
    pub chart_spec: Option<ChartSpec>,
    pub data_point_count: usize,
    pub summary: Option<ChartSummary>,
    pub authors: Vec<String>,
}

impl ChartEnvelope {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            chart_spec: None,
            data_point_count: 0,
            summary: None,
            authors: Vec::new(),
        }
    }
}

impl From<ChartOutcome> for ChartEnvelope {
    fn from(outcome: ChartOutcome) -> Self {
        Self {
            success: true,
            message: outcome.message,
            chart_spec: Some(outcome.chart_spec),
            data_point_count: outcome.data_point_count,
            summary: outcome.summary,
            authors: outcome.authors,
        }
    }
}

/// Response body for management commands. Every field is always present.
#[derive(Debug, Clone, Serialize)]
pub struct ManageEnvelope {
    pub success: bool,
    pub message: String,
    pub operation: Option<Operation>,
    pub posts: Vec<Post>,
    pub affected: u64,
}

impl ManageEnvelope {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            operation: None,
            posts: Vec::new(),
            affected: 0,
        }
    }
}

impl From<ManageOutcome> for ManageEnvelope {
    fn from(outcome: ManageOutcome) -> Self {
        Self {
            success: true,
            message: outcome.message,
            operation: Some(outcome.operation),
            posts: outcome.posts,
            affected: outcome.affected,
        }
    }
}

fn outcome_label(err: &BoardError) -> &'static str {
    match err {
        BoardError::Store(_) => "failed",
        _ => "rejected",
    }
}

#[derive(Clone)]
pub struct BoardService {
    posts: PostService,
    interpreter: Arc<dyn CommandInterpreter>,
    activity: Arc<ActivityLog>,
}

impl BoardService {
    pub fn new(
        posts: PostService,
        interpreter: Arc<dyn CommandInterpreter>,
        activity: Arc<ActivityLog>,
    ) -> Self {
        Self {
            posts,
            interpreter,
            activity,
        }
    }

    pub fn posts(&self) -> &PostService {
        &self.posts
    }

    /// Interpret a chart command and build the chart.
    pub async fn chart_from_command(&self, text: &str) -> Result<ChartOutcome, BoardError> {
        let started = Instant::now();
        let result = self.run_chart_command(text).await;
        self.finish(ActivityCategory::Chart, Operation::Chart, text, started, &result, |o| {
            format!("chart generated for {}", o.authors.join(", "))
        });
        result
    }

    async fn run_chart_command(&self, text: &str) -> Result<ChartOutcome, BoardError> {
        let command = self.interpret(text).await?;
        if command.operation != Operation::Chart {
            return Err(BoardError::OperationMismatch {
                operation: command.operation,
                expected: "manage",
            });
        }

        match command.authors {
            AuthorSelection::Single(author) => self.single_author_chart(&author, command.chart_kind).await,
            AuthorSelection::Many(authors) => self.multi_author_chart(authors, command.chart_kind).await,
            AuthorSelection::All => {
                let authors = self.posts.authors().await?;
                if authors.is_empty() {
                    return Err(BoardError::EmptyDataset { authors });
                }
                self.multi_author_chart(authors, command.chart_kind).await
            }
            AuthorSelection::None => Err(BoardError::unparseable(
                "could not find an author name in the command",
            )),
        }
    }

    /// Chart one author's data directly, without interpretation.
    pub async fn chart_for_author(
        &self,
        author: &str,
        kind: ChartKind,
    ) -> Result<ChartOutcome, BoardError> {
        let started = Instant::now();
        let result = self.single_author_chart(author.trim(), kind).await;
        self.finish(ActivityCategory::Chart, Operation::Chart, author, started, &result, |o| {
            format!("chart generated for {}", o.authors.join(", "))
        });
        result
    }

    /// Interpret a management command and apply it.
    pub async fn manage_from_command(&self, text: &str) -> Result<ManageOutcome, BoardError> {
        let started = Instant::now();
        let result = self.run_manage_command(text).await;
        let operation = result
            .as_ref()
            .map(|o| o.operation)
            .unwrap_or(Operation::Unknown);
        self.finish(ActivityCategory::Manage, operation, text, started, &result, |o| {
            o.message.clone()
        });
        result
    }

    async fn run_manage_command(&self, text: &str) -> Result<ManageOutcome, BoardError> {
        let command = self.interpret(text).await?;

        match command.operation {
            Operation::Create => {
                let fallback = command.authors.single().map(str::to_string);
                let new_post = command
                    .fields
                    .into_new_post(fallback.as_deref())
                    .ok_or_else(|| {
                        BoardError::InvalidPost("a new post needs a title and an author".to_string())
                    })?;
                let post = self.posts.create_post(new_post).await?;
                Ok(ManageOutcome {
                    operation: Operation::Create,
                    message: format!("post #{} created", post.id),
                    posts: vec![post],
                    affected: 1,
                })
            }
            Operation::Update => {
                let id = command.post_id.ok_or_else(|| {
                    BoardError::InvalidPost("specify which post to update".to_string())
                })?;
                let post = self
                    .posts
                    .update_post(id, command.fields.into_patch())
                    .await?;
                Ok(ManageOutcome {
                    operation: Operation::Update,
                    message: format!("post #{} updated", id),
                    posts: vec![post],
                    affected: 1,
                })
            }
            Operation::Delete => match (command.post_id, command.authors.single()) {
                (Some(id), _) => {
                    let post = self.posts.get_post(id).await?;
                    self.posts.delete_post(id).await?;
                    Ok(ManageOutcome {
                        operation: Operation::Delete,
                        message: format!("post #{} deleted", id),
                        posts: vec![post],
                        affected: 1,
                    })
                }
                (None, Some(author)) => {
                    let removed = self.posts.delete_by_author(author).await?;
                    Ok(ManageOutcome {
                        operation: Operation::Delete,
                        message: format!("{} posts by {} deleted", removed, author),
                        posts: Vec::new(),
                        affected: removed,
                    })
                }
                (None, None) => Err(BoardError::InvalidPost(
                    "specify a post number or an author to delete".to_string(),
                )),
            },
            Operation::List => {
                let (posts, message) = match command.authors.single() {
                    Some(author) => {
                        let posts = self.posts.list_by_author(author).await?;
                        let message = format!("{} posts by {}", posts.len(), author);
                        (posts, message)
                    }
                    None => {
                        let posts = self.posts.list_posts().await?;
                        let message = format!("{} posts", posts.len());
                        (posts, message)
                    }
                };
                Ok(ManageOutcome {
                    operation: Operation::List,
                    message,
                    affected: posts.len() as u64,
                    posts,
                })
            }
            operation @ (Operation::Chart | Operation::Unknown) => {
                Err(BoardError::OperationMismatch {
                    operation,
                    expected: "chart",
                })
            }
        }
    }

    async fn interpret(&self, text: &str) -> Result<ParsedCommand, BoardError> {
        if text.trim().is_empty() {
            return Err(BoardError::unparseable("enter a command"));
        }

        let started = Instant::now();
        let command = self.interpreter.interpret(text).await;
        self.activity.record(
            ActivityEntry::new(
                if command.valid {
                    ActivityLevel::Info
                } else {
                    ActivityLevel::Warning
                },
                ActivityCategory::Interpret,
                format!("interpreted as {}", command.operation),
            )
            .with_details(serde_json::json!({
                "command": text,
                "strategy": self.interpreter.name(),
                "valid": command.valid,
                "reason": command.reason,
                "confidence": command.confidence,
            }))
            .with_duration(started.elapsed()),
        );

        if command.valid {
            return Ok(command);
        }

        // Listing known authors is a courtesy; a store failure here must not mask the input error.
        let known_authors = self.posts.authors().await.unwrap_or_default();
        Err(BoardError::InputUnparseable {
            reason: command
                .reason
                .unwrap_or_else(|| "the command could not be understood".to_string()),
            known_authors,
        })
    }

    async fn single_author_chart(
        &self,
        author: &str,
        kind: ChartKind,
    ) -> Result<ChartOutcome, BoardError> {
        let posts = self.posts.list_by_author(author).await?;
        if posts.is_empty() {
            return Err(BoardError::AuthorNotFound {
                authors: vec![author.to_string()],
            });
        }

        let series = vec![AuthorSeries::from_posts(author, &posts)];
        self.build_chart(series, kind)
    }

    /// Authors without numeric data are dropped from the chart.
    async fn multi_author_chart(
        &self,
        authors: Vec<String>,
        kind: ChartKind,
    ) -> Result<ChartOutcome, BoardError> {
        let mut series = Vec::with_capacity(authors.len());
        let mut any_posts = false;
        for author in &authors {
            let posts = self.posts.list_by_author(author).await?;
            any_posts |= !posts.is_empty();
            series.push(AuthorSeries::from_posts(author.as_str(), &posts));
        }

        if !any_posts {
            return Err(BoardError::AuthorNotFound { authors });
        }
        self.build_chart(series, kind)
    }

    fn build_chart(
        &self,
        series: Vec<AuthorSeries>,
        kind: ChartKind,
    ) -> Result<ChartOutcome, BoardError> {
        let requested: Vec<String> = series.iter().map(|s| s.author.clone()).collect();
        let chart_spec = chart::assemble(&series, kind).map_err(|err| match err {
            ChartError::EmptyDataset => BoardError::EmptyDataset {
                authors: requested.clone(),
            },
        })?;

        let authors: Vec<String> = series
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| s.author.clone())
            .collect();
        let data_point_count = chart_spec.data_point_count();
        CHART_POINTS.observe(data_point_count as f64);

        info!(
            authors = %authors.join(", "),
            kind = %kind,
            data_point_count,
            "chart assembled"
        );

        Ok(ChartOutcome {
            message: format!(
                "{} for {} ({} data points)",
                kind.display_name(),
                authors.join(", "),
                data_point_count
            ),
            summary: ChartSummary::from_series(&series),
            chart_spec,
            data_point_count,
            authors,
        })
    }

    fn finish<T>(
        &self,
        category: ActivityCategory,
        operation: Operation,
        input: &str,
        started: Instant,
        result: &Result<T, BoardError>,
        describe: impl FnOnce(&T) -> String,
    ) {
        let entry = match result {
            Ok(value) => {
                metrics::record_command(operation.as_str(), "ok");
                ActivityEntry::new(ActivityLevel::Success, category, describe(value))
            }
            Err(err) => {
                let outcome = outcome_label(err);
                metrics::record_command(operation.as_str(), outcome);
                if outcome == "failed" {
                    warn!(error = %err, input = %input, "board command failed");
                }
                ActivityEntry::new(ActivityLevel::Error, category, err.to_string())
            }
        };

        self.activity.record(
            entry
                .with_details(serde_json::json!({ "input": input }))
                .with_duration(started.elapsed()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryPostStore;
    use crate::interpreter::PatternInterpreter;
    use crate::models::NewPost;

    async fn board_with(posts: Vec<NewPost>) -> BoardService {
        let service = PostService::new(Arc::new(InMemoryPostStore::new()));
        for post in posts {
            service.create_post(post).await.unwrap();
        }
        BoardService::new(
            service,
            Arc::new(PatternInterpreter::new()),
            Arc::new(ActivityLog::default()),
        )
    }

    fn sample() -> Vec<NewPost> {
        vec![
            NewPost::new("hong", "jan").with_value(150.0),
            NewPost::new("hong", "feb").with_value(170.0),
            NewPost::new("kim", "users").with_value(40.0),
            NewPost::new("lee", "notes"),
        ]
    }

    #[tokio::test]
    async fn single_author_chart_in_creation_order() {
        let board = board_with(sample()).await;
        let outcome = board
            .chart_from_command("hong's data as a line chart")
            .await
            .unwrap();
        assert_eq!(outcome.chart_spec.kind, ChartKind::Line);
        assert_eq!(outcome.chart_spec.data.labels, vec!["jan", "feb"]);
        assert_eq!(outcome.data_point_count, 2);
        assert_eq!(outcome.authors, vec!["hong"]);
        assert_eq!(outcome.summary.unwrap().overall.total, 320.0);
    }

    #[tokio::test]
    async fn unknown_author_is_not_found() {
        let board = board_with(sample()).await;
        let err = board.chart_from_command("park's data").await.unwrap_err();
        assert!(matches!(err, BoardError::AuthorNotFound { ref authors } if authors == &["park"]));
    }

    #[tokio::test]
    async fn author_without_values_is_an_empty_dataset() {
        let board = board_with(sample()).await;
        let err = board.chart_from_command("lee's data").await.unwrap_err();
        assert!(matches!(err, BoardError::EmptyDataset { .. }));
    }

    #[tokio::test]
    async fn invalid_command_lists_known_authors() {
        let board = board_with(sample()).await;
        match board.chart_from_command("show me a chart").await {
            Err(BoardError::InputUnparseable {
                reason,
                known_authors,
            }) => {
                assert!(reason.contains("author"));
                assert_eq!(known_authors, vec!["hong", "kim"]);
            }
            other => panic!("unexpected result: {:?}", other.map(|o| o.message)),
        }
    }

    #[tokio::test]
    async fn multi_author_drops_authors_without_values() {
        let board = board_with(sample()).await;
        let outcome = board
            .chart_from_command("hong, kim and lee data as bar chart")
            .await
            .unwrap();
        assert_eq!(outcome.authors, vec!["hong", "kim"]);
        assert_eq!(outcome.chart_spec.data.datasets.len(), 2);
        assert_eq!(outcome.data_point_count, 3);
    }

    #[tokio::test]
    async fn multi_author_pie_counts_plotted_slices() {
        let board = board_with(sample()).await;
        let outcome = board
            .chart_from_command("all authors as a pie chart")
            .await
            .unwrap();
        assert_eq!(outcome.chart_spec.data.datasets[0].data, vec![320.0, 40.0]);
        assert_eq!(outcome.data_point_count, 2);
        assert_eq!(outcome.summary.map(|s| s.total_points), Some(3));
    }

    #[tokio::test]
    async fn multi_author_with_no_posts_at_all_is_not_found() {
        let board = board_with(sample()).await;
        let err = board
            .chart_from_command("park and choi data as bar chart")
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::AuthorNotFound { .. }));

        let err = board
            .chart_from_command("lee and park data as bar chart")
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::EmptyDataset { .. }));
    }

    #[tokio::test]
    async fn all_authors_uses_numeric_authors() {
        let board = board_with(sample()).await;
        let outcome = board
            .chart_from_command("all authors as a pie chart")
            .await
            .unwrap();
        assert_eq!(outcome.chart_spec.data.labels, vec!["hong", "kim"]);
        assert_eq!(outcome.chart_spec.data.datasets[0].data, vec![320.0, 40.0]);

        let empty = board_with(vec![]).await;
        assert!(matches!(
            empty.chart_from_command("all authors as a pie chart").await,
            Err(BoardError::EmptyDataset { .. })
        ));
    }

    #[tokio::test]
    async fn management_commands_are_rejected_on_the_chart_path() {
        let board = board_with(sample()).await;
        assert!(matches!(
            board.chart_from_command("3번 게시글 삭제").await,
            Err(BoardError::OperationMismatch { expected: "manage", .. })
        ));
        assert!(matches!(
            board.manage_from_command("hong's data as bar chart").await,
            Err(BoardError::OperationMismatch { expected: "chart", .. })
        ));
    }

    #[tokio::test]
    async fn create_update_list_delete_by_command() {
        let board = board_with(vec![]).await;

        let created = board
            .manage_from_command("홍길동으로 새 게시글 작성: 제목 '4월 매출', 수치 210.5")
            .await
            .unwrap();
        assert_eq!(created.operation, Operation::Create);
        let id = created.posts[0].id;
        assert_eq!(created.posts[0].numeric_value, Some(210.5));

        let updated = board
            .manage_from_command(&format!("{}번 게시글 수치를 300으로 수정", id))
            .await
            .unwrap();
        assert_eq!(updated.posts[0].numeric_value, Some(300.0));
        assert_eq!(updated.posts[0].title, "4월 매출");

        let listed = board.manage_from_command("게시글 목록 보여줘").await.unwrap();
        assert_eq!(listed.affected, 1);

        let deleted = board
            .manage_from_command(&format!("{}번 게시글 삭제", id))
            .await
            .unwrap();
        assert_eq!(deleted.affected, 1);
        assert!(board.posts().list_posts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_by_author_command() {
        let board = board_with(sample()).await;
        let outcome = board
            .manage_from_command("delete all posts by hong")
            .await
            .unwrap();
        assert_eq!(outcome.affected, 2);
        assert!(outcome.posts.is_empty());
    }

    #[tokio::test]
    async fn empty_command_is_unparseable() {
        let board = board_with(vec![]).await;
        assert!(matches!(
            board.manage_from_command("  ").await,
            Err(BoardError::InputUnparseable { .. })
        ));
    }

    #[tokio::test]
    async fn outcomes_are_recorded_in_the_activity_log() {
        let store = PostService::new(Arc::new(InMemoryPostStore::new()));
        let activity = Arc::new(ActivityLog::default());
        let board = BoardService::new(store, Arc::new(PatternInterpreter::new()), activity.clone());

        let _ = board.chart_from_command("hong's data").await;
        let entries = activity.recent(None);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].category, ActivityCategory::Interpret);
        assert_eq!(entries[1].level, ActivityLevel::Error);
    }
}

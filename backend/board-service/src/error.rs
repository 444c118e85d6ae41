/// Error types for Board Service
///
/// Domain errors are raised at three boundaries (data store, command
/// interpretation, chart assembly) and folded into `BoardError` by the
/// orchestration layer. `AppError` turns any of them into a JSON HTTP response.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::fmt;

use crate::models::Operation;

/// Result type for HTTP-facing operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Message sent to clients whenever the store itself misbehaves.
pub const STORE_FAILURE_MESSAGE: &str = "internal error while accessing the board";

const EXAMPLE_COMMANDS: &[&str] = &[
    "홍길동의 데이터를 막대그래프로 보여줘",
    "hong's data as a line chart",
    "hong and kim data as bar chart",
    "모든 사람들의 데이터를 파이 차트로",
];

/// Failures of the post store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failures surfaced by the board orchestration layer.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// Neither strategy could turn the command into a usable intent.
    #[error("{}", unparseable_message(.reason, .known_authors))]
    InputUnparseable {
        reason: String,
        known_authors: Vec<String>,
    },

    #[error("no posts found for {}", describe_authors(.authors))]
    AuthorNotFound { authors: Vec<String> },

    #[error("no numeric data for {}", describe_authors(.authors))]
    EmptyDataset { authors: Vec<String> },

    #[error("post #{0} does not exist")]
    PostNotFound(i64),

    #[error("invalid post: {0}")]
    InvalidPost(String),

    /// A management command reached the chart entry point or vice versa.
    #[error("'{operation}' commands are not handled here, use the {expected} endpoint")]
    OperationMismatch {
        operation: Operation,
        expected: &'static str,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BoardError {
    pub fn unparseable(reason: impl Into<String>) -> Self {
        BoardError::InputUnparseable {
            reason: reason.into(),
            known_authors: Vec::new(),
        }
    }
}

fn describe_authors(authors: &[String]) -> String {
    if authors.is_empty() {
        "any author on the board".to_string()
    } else {
        authors.join(", ")
    }
}

fn unparseable_message(reason: &str, known_authors: &[String]) -> String {
    let mut message = format!(
        "{}. Try commands like: {}",
        reason.trim_end_matches('.'),
        EXAMPLE_COMMANDS
            .iter()
            .map(|c| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(", ")
    );
    if !known_authors.is_empty() {
        message.push_str(&format!(". Available authors: {}", known_authors.join(", ")));
    }
    message
}

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Database operation failed
    DatabaseError(String),

    /// Validation failed
    ValidationError(String),

    /// Resource not found
    NotFound(String),

    /// Bad request
    BadRequest(String),

    /// Request understood but there is nothing to render
    Unprocessable(String),

    /// Internal server error
    Internal(String),
}

impl AppError {
    /// Message safe to show to API clients. Infrastructure details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::DatabaseError(_) | AppError::Internal(_) => STORE_FAILURE_MESSAGE.to_string(),
            AppError::ValidationError(msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Unprocessable(msg) => msg.clone(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unprocessable(msg) => write!(f, "Unprocessable: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        HttpResponse::build(status).json(serde_json::json!({
            "success": false,
            "message": self.public_message(),
            "status": status.as_u16(),
        }))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<BoardError> for AppError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::InputUnparseable { .. } | BoardError::OperationMismatch { .. } => {
                AppError::BadRequest(err.to_string())
            }
            BoardError::InvalidPost(_) => AppError::ValidationError(err.to_string()),
            BoardError::AuthorNotFound { .. } | BoardError::PostNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            BoardError::EmptyDataset { .. } => AppError::Unprocessable(err.to_string()),
            BoardError::Store(store) => AppError::from(store),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(crate::models::describe_validation(&err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Board Service Library
///
/// A bulletin board of posts whose numeric values can be charted. Charts and
/// post changes are requested with free-text commands (Korean or English),
/// interpreted either by deterministic patterns or by a remote language model
/// that falls back to the patterns.
///
/// # Modules
///
/// - `interpreter`: command interpretation strategies
/// - `chart`: declarative Chart.js-shaped chart assembly
/// - `services`: orchestration and post management
/// - `handlers`: HTTP request handlers
/// - `db`: post store trait plus PostgreSQL and in-memory backends
/// - `llm`: remote model client, timeouts and retries
/// - `activity`: bounded activity log
/// - `models`: posts and parsed commands
/// - `middleware`: HTTP metrics middleware
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod activity;
pub mod chart;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod interpreter;
pub mod llm;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

/// HTTP handlers for board-service
///
/// - Commands: free-text chart and post-management commands
/// - Posts: plain CRUD over the board
/// - Meta: authors, chart kinds, interpreter status, activity and health
use actix_web::web;
use std::sync::Arc;

use crate::activity::ActivityLog;
use crate::error::AppError;
use crate::interpreter::InterpreterSwitch;
use crate::metrics::serve_metrics;
use crate::middleware::MetricsMiddleware;
use crate::services::{BoardService, PostService};

pub mod commands;
pub mod meta;
pub mod posts;

pub use commands::{chart_command, chart_for_author, manage_command};
pub use meta::{
    activity_log, authors, chart_types, clear_activity, health_summary, interpreter_status,
    liveness_check, set_credential,
};
pub use posts::{create_post, delete_post, get_post, list_posts, posts_by_author, update_post};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub board: BoardService,
    pub interpreter: Arc<InterpreterSwitch>,
    pub activity: Arc<ActivityLog>,
}

impl AppState {
    pub fn new(
        board: BoardService,
        interpreter: Arc<InterpreterSwitch>,
        activity: Arc<ActivityLog>,
    ) -> Self {
        Self {
            board,
            interpreter,
            activity,
        }
    }

    pub fn posts(&self) -> &PostService {
        self.board.posts()
    }
}

/// Register every route. Shared by the server and the HTTP tests.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into());
    let path_config = web::PathConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into());
    let query_config = web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into());

    cfg.app_data(json_config)
        .app_data(path_config)
        .app_data(query_config)
        .route("/metrics", web::get().to(serve_metrics))
        .route("/api/v1/health", web::get().to(health_summary))
        .route("/api/v1/health/live", web::get().to(liveness_check))
        .service(
            web::scope("/api/v1")
                .wrap(MetricsMiddleware)
                .service(
                    web::scope("/commands")
                        .route("/chart", web::post().to(chart_command))
                        .route("/manage", web::post().to(manage_command)),
                )
                .route("/charts/{author}", web::get().to(chart_for_author))
                .service(
                    web::scope("/posts")
                        .service(
                            web::resource("")
                                .route(web::get().to(list_posts))
                                .route(web::post().to(create_post)),
                        )
                        .service(
                            web::resource("/author/{author}")
                                .route(web::get().to(posts_by_author)),
                        )
                        .service(
                            web::resource("/{post_id}")
                                .route(web::get().to(get_post))
                                .route(web::put().to(update_post))
                                .route(web::delete().to(delete_post)),
                        ),
                )
                .route("/authors", web::get().to(authors))
                .route("/chart-types", web::get().to(chart_types))
                .service(
                    web::scope("/interpreter")
                        .route("/status", web::get().to(interpreter_status))
                        .route("/credential", web::put().to(set_credential)),
                )
                .service(
                    web::resource("/activity")
                        .route(web::get().to(activity_log))
                        .route(web::delete().to(clear_activity)),
                ),
        );
}

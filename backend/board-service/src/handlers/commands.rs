/// Command handlers - free-text chart and management commands
use actix_web::{error::ResponseError, web, HttpResponse};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::{AppError, BoardError};
use crate::models::ChartKind;
use crate::services::{ChartEnvelope, ManageEnvelope};

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    #[serde(default)]
    pub command: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub kind: Option<String>,
}

/// Failures still answer with the full envelope, carrying the mapped status.
fn envelope_failure<T: Serialize>(err: BoardError, build: impl FnOnce(String) -> T) -> HttpResponse {
    let err = AppError::from(err);
    let status = err.status_code();
    if status.is_server_error() {
        tracing::error!(error = %err, "command failed");
    } else {
        tracing::debug!(error = %err, "command rejected");
    }
    HttpResponse::build(status).json(build(err.public_message()))
}

/// POST /api/v1/commands/chart
pub async fn chart_command(
    state: web::Data<AppState>,
    req: web::Json<CommandRequest>,
) -> HttpResponse {
    match state.board.chart_from_command(&req.command).await {
        Ok(outcome) => HttpResponse::Ok().json(ChartEnvelope::from(outcome)),
        Err(err) => envelope_failure(err, ChartEnvelope::failure),
    }
}

/// POST /api/v1/commands/manage
pub async fn manage_command(
    state: web::Data<AppState>,
    req: web::Json<CommandRequest>,
) -> HttpResponse {
    match state.board.manage_from_command(&req.command).await {
        Ok(outcome) => HttpResponse::Ok().json(ManageEnvelope::from(outcome)),
        Err(err) => envelope_failure(err, ManageEnvelope::failure),
    }
}

/// GET /api/v1/charts/{author}?kind=line
pub async fn chart_for_author(
    state: web::Data<AppState>,
    author: web::Path<String>,
    query: web::Query<ChartQuery>,
) -> HttpResponse {
    let kind = query
        .kind
        .as_deref()
        .map(ChartKind::coerce)
        .unwrap_or_default();

    match state.board.chart_for_author(&author, kind).await {
        Ok(outcome) => HttpResponse::Ok().json(ChartEnvelope::from(outcome)),
        Err(err) => envelope_failure(err, ChartEnvelope::failure),
    }
}

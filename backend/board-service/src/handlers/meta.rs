/// Board metadata, interpreter control, activity and health endpoints
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::{AppError, Result};
use crate::interpreter::CHART_KEYWORDS;
use crate::llm::LlmError;
use crate::models::ChartKind;

/// GET /api/v1/authors - authors with numeric data
pub async fn authors(state: web::Data<AppState>) -> Result<HttpResponse> {
    let authors = state.posts().authors().await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": authors.len(),
        "authors": authors,
    })))
}

#[derive(Debug, Serialize)]
struct ChartTypeInfo {
    kind: ChartKind,
    name: &'static str,
    keywords: Vec<&'static str>,
}

/// GET /api/v1/chart-types
pub async fn chart_types() -> HttpResponse {
    let types: Vec<ChartTypeInfo> = ChartKind::ALL
        .iter()
        .map(|kind| ChartTypeInfo {
            kind: *kind,
            name: kind.display_name(),
            keywords: CHART_KEYWORDS
                .iter()
                .filter(|entry| entry.kind == *kind)
                .flat_map(|entry| entry.korean.iter().chain(entry.english.iter()).copied())
                .collect(),
        })
        .collect();

    HttpResponse::Ok().json(serde_json::json!({
        "default": ChartKind::default(),
        "chart_types": types,
    }))
}

/// GET /api/v1/interpreter/status
pub async fn interpreter_status(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.interpreter.status().await)
}

#[derive(Debug, Deserialize)]
pub struct CredentialRequest {
    #[serde(default)]
    pub api_key: String,
}

/// PUT /api/v1/interpreter/credential
pub async fn set_credential(
    state: web::Data<AppState>,
    req: web::Json<CredentialRequest>,
) -> Result<HttpResponse> {
    state
        .interpreter
        .set_credential(&req.api_key)
        .await
        .map_err(|err| match err {
            LlmError::NotConfigured => AppError::BadRequest("api_key must not be empty".to_string()),
            other => AppError::Internal(other.to_string()),
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "remote interpreter enabled",
        "status": state.interpreter.status().await,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
}

/// GET /api/v1/activity?limit=20
pub async fn activity_log(
    state: web::Data<AppState>,
    query: web::Query<ActivityQuery>,
) -> HttpResponse {
    let entries = state.activity.recent(query.limit);
    HttpResponse::Ok().json(serde_json::json!({
        "count": entries.len(),
        "capacity": state.activity.capacity(),
        "entries": entries,
    }))
}

/// DELETE /api/v1/activity
pub async fn clear_activity(state: web::Data<AppState>) -> HttpResponse {
    state.activity.clear();
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "activity log cleared",
    }))
}

pub async fn health_summary(state: web::Data<AppState>) -> HttpResponse {
    let store = state.posts().store();
    let strategy = state.interpreter.status().await.strategy;

    match store.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "board-service",
            "version": env!("CARGO_PKG_VERSION"),
            "store": store.backend(),
            "interpreter": strategy,
        })),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "service": "board-service",
                "store": store.backend(),
            }))
        }
    }
}

pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

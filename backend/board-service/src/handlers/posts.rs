/// Post handlers - HTTP endpoints for post operations
use actix_web::{web, HttpResponse};

use super::AppState;
use crate::error::Result;
use crate::models::{NewPost, PostPatch};

/// List all posts, newest first
pub async fn list_posts(state: web::Data<AppState>) -> Result<HttpResponse> {
    let posts = state.posts().list_posts().await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// Create a new post
pub async fn create_post(
    state: web::Data<AppState>,
    req: web::Json<NewPost>,
) -> Result<HttpResponse> {
    let post = state.posts().create_post(req.into_inner()).await?;
    Ok(HttpResponse::Created().json(post))
}

/// Get a post by ID
pub async fn get_post(state: web::Data<AppState>, post_id: web::Path<i64>) -> Result<HttpResponse> {
    let post = state.posts().get_post(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// Partially update a post
pub async fn update_post(
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
    req: web::Json<PostPatch>,
) -> Result<HttpResponse> {
    let post = state
        .posts()
        .update_post(post_id.into_inner(), req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn delete_post(
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    state.posts().delete_post(post_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": format!("post #{} deleted", post_id),
    })))
}

/// Posts of one author in creation order
pub async fn posts_by_author(
    state: web::Data<AppState>,
    author: web::Path<String>,
) -> Result<HttpResponse> {
    let posts = state.posts().list_by_author(&author).await?;
    Ok(HttpResponse::Ok().json(posts))
}

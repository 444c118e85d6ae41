/// PostgreSQL-backed post store
use async_trait::async_trait;
use sqlx::PgPool;

use super::PostStore;
use crate::error::StoreError;
use crate::models::{DeleteTarget, NewPost, Post, PostPatch};

const POST_COLUMNS: &str = "id, author, title, content, numeric_value, category, created_at";

#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn create(&self, post: NewPost) -> Result<Post, StoreError> {
        let created = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (author, title, content, numeric_value, category)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&post.author)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.numeric_value)
        .bind(&post.category)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(post_id = created.id, author = %created.author, "post inserted");
        Ok(created)
    }

    async fn get(&self, id: i64) -> Result<Option<Post>, StoreError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn update(&self, id: i64, patch: PostPatch) -> Result<Option<Post>, StoreError> {
        let updated = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET author = COALESCE($2, author),
                title = COALESCE($3, title),
                content = COALESCE($4, content),
                numeric_value = COALESCE($5, numeric_value),
                category = COALESCE($6, category)
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&patch.author)
        .bind(&patch.title)
        .bind(&patch.content)
        .bind(patch.numeric_value)
        .bind(&patch.category)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete(&self, target: DeleteTarget) -> Result<u64, StoreError> {
        let result = match &target {
            DeleteTarget::Id(id) => {
                sqlx::query("DELETE FROM posts WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool)
                    .await?
            }
            DeleteTarget::Author(author) => {
                sqlx::query("DELETE FROM posts WHERE author = $1")
                    .bind(author)
                    .execute(&self.pool)
                    .await?
            }
        };

        tracing::debug!(?target, removed = result.rows_affected(), "posts deleted");
        Ok(result.rows_affected())
    }

    async fn list_all(&self) -> Result<Vec<Post>, StoreError> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn list_by_author(&self, author: &str) -> Result<Vec<Post>, StoreError> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE author = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(author)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn list_authors_with_numeric_data(&self) -> Result<Vec<String>, StoreError> {
        let authors = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT author
            FROM posts
            WHERE numeric_value IS NOT NULL
            ORDER BY author
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(authors)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

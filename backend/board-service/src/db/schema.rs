/// Startup schema bootstrap and sample data.
use sqlx::PgPool;
use tracing::info;

use super::PostStore;
use crate::error::StoreError;
use crate::models::NewPost;

/// Create the posts table and its author index if missing.
pub async fn ensure_posts_table(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id BIGSERIAL PRIMARY KEY,
            author VARCHAR(50) NOT NULL,
            title VARCHAR(200) NOT NULL,
            content TEXT,
            numeric_value DOUBLE PRECISION,
            category VARCHAR(50),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_posts_author_created_at ON posts (author, created_at)",
    )
    .execute(pool)
    .await?;

    info!("posts table ensured");
    Ok(())
}

pub fn sample_posts() -> Vec<NewPost> {
    vec![
        NewPost::new("홍길동", "1월 매출 보고")
            .with_content("1월 매출 데이터입니다.")
            .with_value(150.5)
            .with_category("매출"),
        NewPost::new("홍길동", "2월 매출 보고")
            .with_content("2월 매출 데이터입니다.")
            .with_value(180.2)
            .with_category("매출"),
        NewPost::new("홍길동", "3월 매출 보고")
            .with_content("3월 매출 데이터입니다.")
            .with_value(200.8)
            .with_category("매출"),
        NewPost::new("김철수", "사용자 수 증가")
            .with_content("월별 사용자 수 현황")
            .with_value(1200.0)
            .with_category("사용자"),
        NewPost::new("김철수", "신규 가입자")
            .with_content("신규 가입자 현황")
            .with_value(850.0)
            .with_category("사용자"),
        NewPost::new("이영희", "서버 성능 지표")
            .with_content("서버 응답시간 측정")
            .with_value(95.5)
            .with_category("성능"),
        NewPost::new("이영희", "데이터베이스 성능")
            .with_content("DB 쿼리 성능 분석")
            .with_value(120.3)
            .with_category("성능"),
    ]
}

/// Insert the sample posts when the store is empty. Returns how many were added.
pub async fn seed_sample_posts(store: &dyn PostStore) -> Result<usize, StoreError> {
    if store.count().await? > 0 {
        return Ok(0);
    }

    let samples = sample_posts();
    let total = samples.len();
    for post in samples {
        store.create(post).await?;
    }

    info!(count = total, "sample posts inserted");
    Ok(total)
}

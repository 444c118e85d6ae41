/// Database access layer for board-service
///
/// `PostStore` is the only seam through which posts are read or written.
/// `PgPostStore` backs it with PostgreSQL; `InMemoryPostStore` keeps the
/// same ordering rules in process for local runs and tests.
use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{DeleteTarget, NewPost, Post, PostPatch};

pub mod memory;
pub mod pool;
pub mod post_repo;
pub mod schema;

pub use memory::InMemoryPostStore;
pub use pool::{create_pool, DbConfig};
pub use post_repo::PgPostStore;
pub use schema::{ensure_posts_table, sample_posts, seed_sample_posts};

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create(&self, post: NewPost) -> Result<Post, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<Post>, StoreError>;

    /// Partial update. `None` when the post does not exist.
    async fn update(&self, id: i64, patch: PostPatch) -> Result<Option<Post>, StoreError>;

    /// Returns the number of removed posts.
    async fn delete(&self, target: DeleteTarget) -> Result<u64, StoreError>;

    /// Every post, newest first.
    async fn list_all(&self) -> Result<Vec<Post>, StoreError>;

    /// Posts of one author in creation order (oldest first).
    async fn list_by_author(&self, author: &str) -> Result<Vec<Post>, StoreError>;

    /// Distinct authors owning at least one post with a numeric value, sorted.
    async fn list_authors_with_numeric_data(&self) -> Result<Vec<String>, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    /// Short backend name for health output.
    fn backend(&self) -> &'static str;
}

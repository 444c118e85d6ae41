/// Post service - validated CRUD over the post store
use std::sync::Arc;
use tracing::info;

use crate::db::PostStore;
use crate::error::BoardError;
use crate::models::{DeleteTarget, NewPost, Post, PostPatch};

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn PostStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn PostStore> {
        &self.store
    }

    /// Create a post after trimming and validating its fields
    pub async fn create_post(&self, post: NewPost) -> Result<Post, BoardError> {
        let post = post.normalized().map_err(BoardError::InvalidPost)?;
        let created = self.store.create(post).await?;
        info!(post_id = created.id, author = %created.author, "post created");
        Ok(created)
    }

    pub async fn get_post(&self, id: i64) -> Result<Post, BoardError> {
        self.store
            .get(id)
            .await?
            .ok_or(BoardError::PostNotFound(id))
    }

    /// Apply a partial update; fields left out keep their value
    pub async fn update_post(&self, id: i64, patch: PostPatch) -> Result<Post, BoardError> {
        if patch.is_empty() {
            return Err(BoardError::InvalidPost("nothing to update".to_string()));
        }
        let patch = patch.normalized().map_err(BoardError::InvalidPost)?;

        let updated = self
            .store
            .update(id, patch)
            .await?
            .ok_or(BoardError::PostNotFound(id))?;
        info!(post_id = id, "post updated");
        Ok(updated)
    }

    pub async fn delete_post(&self, id: i64) -> Result<(), BoardError> {
        match self.store.delete(DeleteTarget::Id(id)).await? {
            0 => Err(BoardError::PostNotFound(id)),
            _ => {
                info!(post_id = id, "post deleted");
                Ok(())
            }
        }
    }

    /// Remove every post of an author. Unknown authors are reported as not found.
    pub async fn delete_by_author(&self, author: &str) -> Result<u64, BoardError> {
        let removed = self
            .store
            .delete(DeleteTarget::Author(author.trim().to_string()))
            .await?;
        if removed == 0 {
            return Err(BoardError::AuthorNotFound {
                authors: vec![author.trim().to_string()],
            });
        }
        info!(author = %author, removed, "posts deleted by author");
        Ok(removed)
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>, BoardError> {
        Ok(self.store.list_all().await?)
    }

    pub async fn list_by_author(&self, author: &str) -> Result<Vec<Post>, BoardError> {
        Ok(self.store.list_by_author(author.trim()).await?)
    }

    /// Authors that have at least one charted value
    pub async fn authors(&self) -> Result<Vec<String>, BoardError> {
        Ok(self.store.list_authors_with_numeric_data().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryPostStore;

    fn service() -> PostService {
        PostService::new(Arc::new(InMemoryPostStore::new()))
    }

    #[tokio::test]
    async fn create_trims_and_validates() {
        let svc = service();
        let post = svc
            .create_post(NewPost::new("  hong ", " Q1 ").with_value(150.0))
            .await
            .unwrap();
        assert_eq!(post.author, "hong");
        assert_eq!(post.title, "Q1");

        let err = svc.create_post(NewPost::new("", "untitled")).await.unwrap_err();
        assert!(matches!(err, BoardError::InvalidPost(_)));
    }

    #[tokio::test]
    async fn missing_posts_are_not_found() {
        let svc = service();
        assert!(matches!(svc.get_post(9).await, Err(BoardError::PostNotFound(9))));
        assert!(matches!(svc.delete_post(9).await, Err(BoardError::PostNotFound(9))));
        assert!(matches!(
            svc.update_post(
                9,
                PostPatch {
                    title: Some("x".into()),
                    ..Default::default()
                }
            )
            .await,
            Err(BoardError::PostNotFound(9))
        ));
    }

    #[tokio::test]
    async fn empty_patch_is_rejected() {
        let svc = service();
        let post = svc.create_post(NewPost::new("hong", "a")).await.unwrap();
        assert!(matches!(
            svc.update_post(post.id, PostPatch::default()).await,
            Err(BoardError::InvalidPost(_))
        ));
    }

    #[tokio::test]
    async fn delete_by_author_counts_removed_posts() {
        let svc = service();
        for title in ["a", "b"] {
            svc.create_post(NewPost::new("hong", title)).await.unwrap();
        }
        svc.create_post(NewPost::new("kim", "c")).await.unwrap();

        assert_eq!(svc.delete_by_author("hong").await.unwrap(), 2);
        assert_eq!(svc.list_posts().await.unwrap().len(), 1);
        assert!(matches!(
            svc.delete_by_author("hong").await,
            Err(BoardError::AuthorNotFound { .. })
        ));
    }
}

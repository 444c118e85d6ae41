/// In-process post store with the same ordering rules as the SQL store.
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::PostStore;
use crate::error::StoreError;
use crate::models::{DeleteTarget, NewPost, Post, PostPatch};

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    posts: Vec<Post>,
}

#[derive(Default)]
pub struct InMemoryPostStore {
    state: RwLock<MemoryState>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn create(&self, post: NewPost) -> Result<Post, StoreError> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let created = Post {
            id: state.next_id,
            author: post.author,
            title: post.title,
            content: post.content,
            numeric_value: post.numeric_value,
            category: post.category,
            created_at: Utc::now(),
        };
        state.posts.push(created.clone());
        Ok(created)
    }

    async fn get(&self, id: i64) -> Result<Option<Post>, StoreError> {
        let state = self.state.read().await;
        Ok(state.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn update(&self, id: i64, patch: PostPatch) -> Result<Option<Post>, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.posts.iter_mut().find(|p| p.id == id).map(|post| {
            patch.apply_to(post);
            post.clone()
        }))
    }

    async fn delete(&self, target: DeleteTarget) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let before = state.posts.len();
        match target {
            DeleteTarget::Id(id) => state.posts.retain(|p| p.id != id),
            DeleteTarget::Author(author) => state.posts.retain(|p| p.author != author),
        }
        Ok((before - state.posts.len()) as u64)
    }

    async fn list_all(&self) -> Result<Vec<Post>, StoreError> {
        let state = self.state.read().await;
        let mut posts = state.posts.clone();
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(posts)
    }

    async fn list_by_author(&self, author: &str) -> Result<Vec<Post>, StoreError> {
        let state = self.state.read().await;
        let mut posts: Vec<Post> = state
            .posts
            .iter()
            .filter(|p| p.author == author)
            .cloned()
            .collect();
        posts.sort_by_key(|p| (p.created_at, p.id));
        Ok(posts)
    }

    async fn list_authors_with_numeric_data(&self) -> Result<Vec<String>, StoreError> {
        let state = self.state.read().await;
        let mut authors: Vec<String> = state
            .posts
            .iter()
            .filter(|p| p.numeric_value.is_some())
            .map(|p| p.author.clone())
            .collect();
        authors.sort();
        authors.dedup();
        Ok(authors)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.state.read().await.posts.len() as i64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

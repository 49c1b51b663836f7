use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::models::{Post, PostView};
use crate::db::repository::{PostRepository, UserRepository};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
}

pub struct PostService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(users: Arc<dyn UserRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { users, posts }
    }

    /// Publish a post owned by `author_id`. The author always comes from the
    /// caller's principal, never from the request body, and must still be a
    /// live account.
    pub async fn create(&self, author_id: Uuid, new_post: NewPost) -> Result<Post, AppError> {
        if new_post.title.trim().is_empty() || new_post.content.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Title and content are required".into(),
            ));
        }

        if self.users.find_by_id(author_id).await?.is_none() {
            warn!(author_id = %author_id, "Post rejected, author account is gone");
            return Err(AppError::NotFound("User".into()));
        }

        let post = Post::new(author_id, new_post.title, new_post.content);
        self.posts.create(&post).await?;

        info!(post_id = %post.id, author_id = %author_id, "Post created");
        Ok(post)
    }

    pub async fn get(&self, id: Uuid) -> Result<PostView, AppError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post".into()))
    }
}

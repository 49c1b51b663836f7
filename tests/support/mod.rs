#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use inkpost_server::db::{Post, PostView};
use inkpost_server::error::DatabaseError;
use inkpost_server::{AppState, PostRepository, Settings, User, UserRepository};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Account store held in memory. Deleted accounts stay in the map but are
/// invisible to lookups, matching the soft-delete behaviour of Postgres.
#[derive(Default)]
pub struct InMemoryUsers {
    rows: RwLock<HashMap<Uuid, (User, bool)>>,
    writes: AtomicUsize,
}

impl InMemoryUsers {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn stored(&self, id: Uuid) -> Option<User> {
        self.rows.read().await.get(&id).map(|(user, _)| user.clone())
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|(user, deleted)| !deleted && user.email == email)
            .map(|(user, _)| user.clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self
            .rows
            .read()
            .await
            .get(&id)
            .filter(|(_, deleted)| !deleted)
            .map(|(user, _)| user.clone()))
    }

    async fn create(&self, user: &User) -> Result<(), DatabaseError> {
        let mut rows = self.rows.write().await;
        if rows.values().any(|(u, deleted)| !deleted && u.email == user.email) {
            return Err(DatabaseError::Duplicate);
        }
        rows.insert(user.id, (user.clone(), false));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), DatabaseError> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&user.id) {
            Some((stored, false)) => {
                *stored = user.clone();
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            _ => Err(DatabaseError::NotFound),
        }
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&id) {
            Some((_, deleted @ false)) => {
                *deleted = true;
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            _ => Err(DatabaseError::NotFound),
        }
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

pub struct InMemoryPosts {
    users: Arc<InMemoryUsers>,
    rows: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPosts {
    pub fn new(users: Arc<InMemoryUsers>) -> Self {
        Self {
            users,
            rows: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryPosts {
    async fn create(&self, post: &Post) -> Result<(), DatabaseError> {
        self.rows.write().await.insert(post.id, post.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostView>, DatabaseError> {
        let post = match self.rows.read().await.get(&id) {
            Some(post) => post.clone(),
            None => return Ok(None),
        };
        let author = match self.users.find_by_id(post.author_id).await? {
            Some(author) => author,
            None => return Ok(None),
        };

        Ok(Some(PostView {
            id: post.id,
            title: post.title,
            content: post.content,
            author: author.view(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }))
    }
}

pub fn test_state() -> (AppState, Arc<InMemoryUsers>) {
    let config = Settings::new_for_test().expect("Failed to load test config");
    let users = Arc::new(InMemoryUsers::default());
    let posts = Arc::new(InMemoryPosts::new(Arc::clone(&users)));
    let state = AppState::with_repositories(config, users.clone(), posts);
    (state, users)
}

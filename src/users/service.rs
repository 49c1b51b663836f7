use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthService;
use crate::db::models::UserView;
use crate::db::repository::UserRepository;
use crate::error::{AppError, AuthError, DatabaseError};

/// Partial profile change. Absent or empty fields are left alone.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub struct ProfileService {
    users: Arc<dyn UserRepository>,
    auth: Arc<AuthService>,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserRepository>, auth: Arc<AuthService>) -> Self {
        Self { users, auth }
    }

    pub async fn get(&self, user_id: Uuid) -> Result<UserView, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|user| user.view())
            .ok_or_else(|| AppError::NotFound("User".into()))
    }

    pub async fn update(&self, user_id: Uuid, update: ProfileUpdate) -> Result<UserView, AppError> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".into()))?;

        if let Some(email) = update.email.filter(|e| !e.is_empty()) {
            if email != user.email {
                if let Some(existing) = self.users.find_by_email(&email).await? {
                    if existing.id != user_id {
                        return Err(AuthError::DuplicateAccount.into());
                    }
                }
                user.email = email;
            }
        }

        if let Some(password) = update.password.filter(|p| !p.is_empty()) {
            user.password_hash = self.auth.hash_new_password(&password).await?;
        }

        if let Some(first_name) = update.first_name {
            user.first_name = Some(first_name).filter(|n| !n.is_empty());
        }
        if let Some(last_name) = update.last_name {
            user.last_name = Some(last_name).filter(|n| !n.is_empty());
        }

        user.updated_at = Utc::now();
        match self.users.update(&user).await {
            Ok(()) => {}
            Err(DatabaseError::Duplicate) => return Err(AuthError::DuplicateAccount.into()),
            Err(DatabaseError::NotFound) => return Err(AppError::NotFound("User".into())),
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %user_id, "Profile updated");
        Ok(user.view())
    }

    /// Soft-delete the account once `password` has been confirmed.
    pub async fn delete(&self, user_id: Uuid, password: &str) -> Result<(), AppError> {
        self.auth.confirm_password(user_id, password).await?;
        self.users.soft_delete(user_id).await.map_err(|e| match e {
            DatabaseError::NotFound => AppError::NotFound("User".into()),
            other => other.into(),
        })?;

        info!(user_id = %user_id, "Account deleted");
        Ok(())
    }
}

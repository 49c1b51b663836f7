//! Registration and login on top of the password hasher and token codec.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::auth::password::{self, MAX_PASSWORD_BYTES};
use crate::auth::token::TokenCodec;
use crate::config::AuthConfig;
use crate::db::models::{User, UserView};
use crate::db::repository::UserRepository;
use crate::error::{AuthError, DatabaseError, HashError};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Returned by a successful registration or login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserView,
}

/// Registration, login, and the other operations that touch a stored
/// credential.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenCodec>,
    hash_cost: u32,
    // Stand-in hash verified on logins for unknown accounts.
    absent_hash: OnceCell<String>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, config: &AuthConfig) -> Self {
        Self {
            users,
            tokens: Arc::new(TokenCodec::new(config.jwt_secret.as_bytes(), config.token_ttl())),
            hash_cost: config.hash_cost,
            absent_hash: OnceCell::new(),
        }
    }

    /// The codec that signs this service's tokens, for the authorization
    /// middleware.
    pub fn tokens(&self) -> Arc<TokenCodec> {
        Arc::clone(&self.tokens)
    }

    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::ValidationFailure(
                "Email and password are required".into(),
            ));
        }
        validate_new_password(password)?;

        if self.users.find_by_email(email).await?.is_some() {
            info!("Registration rejected, account exists");
            return Err(AuthError::DuplicateAccount);
        }

        let password_hash = password::hash_blocking(password.to_string(), self.hash_cost).await?;
        let user = User::new(email.to_string(), password_hash);

        match self.users.create(&user).await {
            Ok(()) => {}
            // Lost a race with a concurrent registration for the same email.
            Err(DatabaseError::Duplicate) => return Err(AuthError::DuplicateAccount),
            Err(e) => {
                error!("Failed to persist new account: {}", e);
                return Err(AuthError::PersistenceFailure(e));
            }
        }

        let token = self.tokens.issue(&user.id.to_string(), &user.email)?;
        info!(user_id = %user.id, "Account registered");

        Ok(AuthResponse { token, user: user.view() })
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::ValidationFailure(
                "Email and password are required".into(),
            ));
        }

        let user = match self.users.find_by_email(email).await? {
            Some(user) => user,
            None => {
                self.burn_verification(password).await?;
                info!("Login failed: no such account");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.password_matches(&user, password).await? {
            info!(user_id = %user.id, "Login failed: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user.id.to_string(), &user.email)?;
        info!(user_id = %user.id, "Login successful");

        Ok(AuthResponse { token, user: user.view() })
    }

    /// Confirm that `password` belongs to the live account `user_id`.
    /// A missing account is reported the same way as a wrong password.
    #[instrument(skip(self, password))]
    pub async fn confirm_password(&self, user_id: Uuid, password: &str) -> Result<User, AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.password_matches(&user, password).await? {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(user)
    }

    /// Hash a replacement password under the current cost.
    pub async fn hash_new_password(&self, password: &str) -> Result<String, AuthError> {
        validate_new_password(password)?;
        Ok(password::hash_blocking(password.to_string(), self.hash_cost).await?)
    }

    async fn burn_verification(&self, password: &str) -> Result<(), AuthError> {
        let cost = self.hash_cost;
        let absent_hash = self
            .absent_hash
            .get_or_try_init(|| password::hash_blocking(Uuid::new_v4().to_string(), cost))
            .await?;
        password::verify_blocking(absent_hash.clone(), password.to_string()).await?;
        Ok(())
    }

    async fn password_matches(&self, user: &User, password: &str) -> Result<bool, AuthError> {
        match password::verify_blocking(user.password_hash.clone(), password.to_string()).await {
            Ok(matches) => Ok(matches),
            Err(HashError::CorruptHash(reason)) => {
                error!(user_id = %user.id, "Stored password hash is corrupt: {}", reason);
                Ok(false)
            }
            Err(e) => {
                warn!(user_id = %user.id, "Password verification failed: {}", e);
                Err(AuthError::HashingFailure(e))
            }
        }
    }
}

pub fn validate_new_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::ValidationFailure(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::ValidationFailure(format!(
            "Password must be at most {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }
    Ok(())
}

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod posts;
pub mod users;

use std::sync::Arc;
use sqlx::PgPool;
use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, warn};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AuthService, Principal, RequireAuth, TokenCodec};
pub use db::{PgPostRepository, PgUserRepository, PostRepository, User, UserRepository};
pub use posts::PostService;
pub use users::ProfileService;

/// Health check endpoint handler
/// Reports whether the store answers; 503 when it does not.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let timestamp = chrono::Utc::now().to_rfc3339();
    match state.users.ping().await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "status": "healthy",
            "database": "connected",
            "timestamp": timestamp
        })),
        Err(e) => {
            warn!("Health check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "unhealthy",
                "database": "disconnected",
                "timestamp": timestamp
            }))
        }
    }
}

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub users: Arc<dyn UserRepository>,
    pub auth_service: Arc<AuthService>,
    pub profiles: Arc<ProfileService>,
    pub posts: Arc<PostService>,
    db_pool: Option<PgPool>,
}

impl AppState {
    /// Connect to Postgres, apply migrations, and build every service.
    pub async fn new(config: Settings) -> Result<Self> {
        let db_pool = db::connect_pool(&config.database).await?;
        db::MIGRATOR.run(&db_pool).await?;
        info!("Database migrations applied");

        let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(db_pool.clone()));
        let posts: Arc<dyn PostRepository> = Arc::new(PgPostRepository::new(db_pool.clone()));

        let mut state = Self::with_repositories(config, users, posts);
        state.db_pool = Some(db_pool);
        Ok(state)
    }

    /// Build the state over arbitrary repositories.
    pub fn with_repositories(
        config: Settings,
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
    ) -> Self {
        let auth_service = Arc::new(AuthService::new(Arc::clone(&users), &config.auth));
        let profiles = Arc::new(ProfileService::new(Arc::clone(&users), Arc::clone(&auth_service)));
        let posts = Arc::new(PostService::new(Arc::clone(&users), posts));

        Self {
            config: Arc::new(config),
            users,
            auth_service,
            profiles,
            posts,
            db_pool: None,
        }
    }

    pub async fn shutdown(&self) -> Result<()> {
        if let Some(pool) = &self.db_pool {
            pool.close().await;
        }
        Ok(())
    }
}

/// Public auth routes, the health check, and the token-gated `/api` scope.
pub fn configure_routes(cfg: &mut web::ServiceConfig, tokens: Arc<TokenCodec>) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid request body: {}", err)).into()
    }))
    .route("/health", web::get().to(health_check))
    .route("/auth/register", web::post().to(auth::handlers::register))
    .route("/auth/login", web::post().to(auth::handlers::login))
    .service(
        web::scope("/api")
            .wrap(RequireAuth::new(tokens))
            .route("/users/me", web::get().to(users::handlers::get_profile))
            .route("/users/me", web::put().to(users::handlers::update_profile))
            .route("/users/me", web::delete().to(users::handlers::delete_profile))
            .route("/posts", web::post().to(posts::handlers::create_post))
            .route("/posts/{id}", web::get().to(posts::handlers::get_post)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{MockPostRepository, MockUserRepository};
    use crate::error::DatabaseError;
    use actix_web::{test, App};
    use serial_test::serial;

    fn state_with(users: MockUserRepository) -> AppState {
        let config = Settings::new_for_test().expect("Failed to load test config");
        AppState::with_repositories(config, Arc::new(users), Arc::new(MockPostRepository::new()))
    }

    #[actix_web::test]
    #[serial]
    async fn test_health_check_healthy() {
        let mut users = MockUserRepository::new();
        users.expect_ping().returning(|| Ok(()));
        let state = state_with(users);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/health", web::get().to(health_check)),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert!(resp.status().is_success());

        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["database"], "connected");
        assert!(chrono::DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());
    }

    #[actix_web::test]
    #[serial]
    async fn test_health_check_unhealthy() {
        let mut users = MockUserRepository::new();
        users
            .expect_ping()
            .returning(|| Err(DatabaseError::ConnectionError("refused".into())));
        let state = state_with(users);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/health", web::get().to(health_check)),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), 503);

        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["status"], "unhealthy");
    }

    #[actix_web::test]
    #[serial]
    async fn test_app_state_clone() {
        let state = state_with(MockUserRepository::new());
        let cloned = state.clone();

        assert!(Arc::ptr_eq(&state.config, &cloned.config));
        assert!(Arc::ptr_eq(&state.auth_service, &cloned.auth_service));
        assert!(state.shutdown().await.is_ok());
    }
}

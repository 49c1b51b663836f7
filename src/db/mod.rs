//! Persistence for accounts and posts.
//!
//! Everything above this module talks to storage through the
//! [`UserRepository`] and [`PostRepository`] traits; the Postgres
//! implementations live alongside them.

pub mod models;
pub mod repository;

pub use models::{Post, PostView, User, UserView};
pub use repository::{
    connect_pool, PgPostRepository, PgUserRepository, PostRepository, UserRepository,
};

/// Embedded schema migrations, applied at startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

//! Authentication and authorization.
//!
//! - [`password`] hashes and verifies credentials (Argon2id).
//! - [`token`] issues and verifies stateless HS256 session tokens.
//! - [`service`] runs registration and login on top of both.
//! - [`middleware`] gates protected routes and attaches a [`Principal`].

pub mod handlers;
pub mod middleware;
pub mod password;
pub mod principal;
pub mod service;
pub mod token;

pub use middleware::RequireAuth;
pub use principal::{current_email, current_user_id, Principal};
pub use service::{AuthResponse, AuthService};
pub use token::{TokenClaims, TokenCodec};

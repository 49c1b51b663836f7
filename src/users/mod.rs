//! The signed-in user's own profile.

pub mod handlers;
pub mod service;

pub use service::{ProfileService, ProfileUpdate};

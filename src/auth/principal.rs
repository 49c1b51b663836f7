//! The authenticated caller, as recorded by [`RequireAuth`](super::RequireAuth).
//!
//! Handlers take a [`Principal`] argument, or call [`current_user_id`] and
//! [`current_email`] on the raw request.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, Ready};
use uuid::Uuid;

use crate::error::{AppError, AuthorizationError};

/// The verified identity behind a request.
///
/// Only [`RequireAuth`](crate::auth::RequireAuth) inserts one, and only after
/// the request's token has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
}

pub fn current_user_id(req: &HttpRequest) -> Option<Uuid> {
    req.extensions().get::<Principal>().map(|p| p.user_id)
}

pub fn current_email(req: &HttpRequest) -> Option<String> {
    req.extensions().get::<Principal>().map(|p| p.email.clone())
}

impl FromRequest for Principal {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Principal>()
                .cloned()
                .ok_or(AppError::AuthorizationError(AuthorizationError::MissingCredential)),
        )
    }
}

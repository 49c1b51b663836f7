//! Bearer-token gate for protected routes.
//!
//! Wrap a scope with [`RequireAuth`] and every request reaching its handlers
//! carries a verified [`Principal`] in its extensions. Anything else is
//! answered with a 401 before the wrapped service runs.

use std::rc::Rc;
use std::sync::Arc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{self, HeaderValue};
use actix_web::{Error, HttpMessage, ResponseError};
use futures::future::{ready, LocalBoxFuture, Ready};
use tracing::warn;
use uuid::Uuid;

use crate::auth::principal::Principal;
use crate::auth::token::TokenCodec;
use crate::error::{AppError, AuthorizationError, TokenError};

#[derive(Clone)]
pub struct RequireAuth {
    tokens: Arc<TokenCodec>,
}

impl RequireAuth {
    pub fn new(tokens: Arc<TokenCodec>) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAuthMiddleware {
            service: Rc::new(service),
            tokens: Arc::clone(&self.tokens),
        }))
    }
}

pub struct RequireAuthMiddleware<S> {
    service: Rc<S>,
    tokens: Arc<TokenCodec>,
}

impl<S, B> Service<ServiceRequest> for RequireAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let outcome = authorize(req.headers().get(header::AUTHORIZATION), &self.tokens);
        match outcome {
            Ok(principal) => {
                req.extensions_mut().insert(principal);
                let service = Rc::clone(&self.service);
                Box::pin(async move {
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                })
            }
            Err(reason) => {
                warn!(path = %req.path(), "Rejected request: {}", reason);
                let response = AppError::AuthorizationError(reason).error_response();
                Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) })
            }
        }
    }
}

/// Turn an `Authorization` header into a verified principal.
pub fn authorize(
    header_value: Option<&HeaderValue>,
    tokens: &TokenCodec,
) -> Result<Principal, AuthorizationError> {
    let value = header_value.ok_or(AuthorizationError::MissingCredential)?;
    let token = parse_bearer(value)?;

    let claims = tokens
        .verify(token)
        .map_err(AuthorizationError::InvalidCredential)?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AuthorizationError::InvalidCredential(TokenError::Malformed))?;

    Ok(Principal {
        user_id,
        email: claims.email,
    })
}

/// Exactly `Bearer <token>`: one space, case-sensitive scheme, non-empty token.
fn parse_bearer(value: &HeaderValue) -> Result<&str, AuthorizationError> {
    let value = value
        .to_str()
        .map_err(|_| AuthorizationError::MalformedCredential)?;

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(token),
        _ => Err(AuthorizationError::MalformedCredential),
    }
}

use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::AppError;
use crate::posts::service::NewPost;
use crate::AppState;

pub async fn create_post(
    principal: Principal,
    req: web::Json<NewPost>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let post = state.posts.create(principal.user_id, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(post))
}

pub async fn get_post(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = Uuid::parse_str(&path)
        .map_err(|_| AppError::ValidationError("Post id must be a UUID".into()))?;
    let post = state.posts.get(id).await?;
    Ok(HttpResponse::Ok().json(post))
}

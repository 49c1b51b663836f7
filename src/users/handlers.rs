use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::auth::Principal;
use crate::error::AppError;
use crate::users::service::ProfileUpdate;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub password: String,
}

pub async fn get_profile(
    principal: Principal,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let view = state.profiles.get(principal.user_id).await?;
    Ok(HttpResponse::Ok().json(view))
}

pub async fn update_profile(
    principal: Principal,
    req: web::Json<ProfileUpdate>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let view = state.profiles.update(principal.user_id, req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Profile updated successfully",
        "user": view
    })))
}

pub async fn delete_profile(
    principal: Principal,
    req: web::Json<DeleteAccountRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.profiles.delete(principal.user_id, &req.password).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "User deleted successfully"
    })))
}

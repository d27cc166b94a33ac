// app/src/web/handlers/profile_handlers.rs

use actix_web::http::header::CONTENT_TYPE;
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::auth_service::{self, ProfileUpdate};
use crate::services::storage;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

pub(crate) fn content_type(req: &HttpRequest) -> Result<String, AppError> {
  req
    .headers()
    .get(CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .map(str::to_string)
    .ok_or_else(|| AppError::Validation("Content-Type header is required.".to_string()))
}

#[instrument(name = "handler::me", skip_all, fields(user_id = %auth_user.id()))]
pub async fn me_handler(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let current = auth_service::current_user(&app_state.hosted, auth_user.user()).await?;
  Ok(HttpResponse::Ok().json(current))
}

#[instrument(name = "handler::get_profile", skip_all, fields(user_id = %auth_user.id()))]
pub async fn get_profile_handler(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let view = auth_service::profile_view(&app_state.hosted, auth_user.user()).await?;
  Ok(HttpResponse::Ok().json(view))
}

#[instrument(name = "handler::update_profile", skip_all, fields(user_id = %auth_user.id()))]
pub async fn update_profile_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, AppError> {
  let view = auth_service::update_profile(
    &app_state.hosted,
    auth_user.access_token(),
    auth_user.user(),
    req_payload.into_inner(),
  )
  .await?;
  Ok(HttpResponse::Ok().json(view))
}

/// Raw image body; the Content-Type header names the format.
#[instrument(name = "handler::upload_avatar", skip_all, fields(user_id = %auth_user.id(), size = body.len()))]
pub async fn upload_avatar_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let content_type = content_type(&req)?;
  let url = storage::upload_avatar(&app_state.hosted, &app_state.config, auth_user.id(), &content_type, body.to_vec()).await?;
  auth_service::set_avatar_url(&app_state.hosted, auth_user.id(), &url).await?;
  info!(%url, "Avatar stored.");
  Ok(HttpResponse::Ok().json(json!({ "avatarUrl": url })))
}

// app/src/web/handlers/page_handlers.rs

//! Page routes. Each returns the view model of its screen as JSON, or a
//! redirect when the screen does not apply to the caller.

use actix_web::http::header::LOCATION;
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::{debug, instrument};

use crate::errors::AppError;
use crate::models::Role;
use crate::services::auth_service::{self, OAUTH_PROVIDERS};
use crate::services::users;
use crate::state::AppState;
use crate::web::dashboard::{self, DashboardRoute};
use crate::web::extractors::{AuthenticatedUser, MaybeUser};
use crate::web::handlers::auth_handlers::RedirectQuery;

fn temporary_redirect(location: &str) -> HttpResponse {
  HttpResponse::TemporaryRedirect()
    .insert_header((LOCATION, location.to_string()))
    .finish()
}

pub async fn login_page(query: web::Query<RedirectQuery>) -> HttpResponse {
  HttpResponse::Ok().json(json!({
    "page": "login",
    "redirect": query.redirect.as_deref().map(|r| auth_service::safe_redirect(Some(r))),
    "providers": OAUTH_PROVIDERS,
  }))
}

pub async fn register_page() -> HttpResponse {
  let roles: Vec<Role> = Role::ALL.into_iter().filter(|r| r.is_self_assignable()).collect();
  HttpResponse::Ok().json(json!({ "page": "register", "roles": roles, "providers": OAUTH_PROVIDERS }))
}

pub async fn forgot_password_page() -> HttpResponse {
  HttpResponse::Ok().json(json!({ "page": "forgot-password" }))
}

pub async fn reset_password_page(auth_user: AuthenticatedUser) -> HttpResponse {
  HttpResponse::Ok().json(json!({ "page": "reset-password", "email": auth_user.user().email }))
}

pub async fn unauthorized_page(user: MaybeUser) -> HttpResponse {
  HttpResponse::Forbidden().json(json!({
    "page": "unauthorized",
    "message": "You do not have access to that page.",
    "signedIn": user.0.is_some(),
  }))
}

#[instrument(name = "page::complete_profile", skip_all, fields(user_id = %auth_user.id()))]
pub async fn complete_profile_page(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  if let Some(row) = users::fetch_user_row(&app_state.hosted, auth_user.id()).await? {
    return Ok(temporary_redirect(row.role.root_path()));
  }
  let roles: Vec<Role> = Role::ALL.into_iter().filter(|r| r.is_self_assignable()).collect();
  let current = auth_service::CurrentUser::from_parts(auth_user.user(), None);
  Ok(HttpResponse::Ok().json(json!({ "page": "complete-profile", "user": current, "roles": roles })))
}

/// `/dashboard` forwards to the caller's own dashboard.
#[instrument(name = "page::dashboard", skip_all, fields(user_id = %auth_user.id()))]
pub async fn dashboard_page(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let row = users::fetch_user_row(&app_state.hosted, auth_user.id()).await?;
  Ok(temporary_redirect(dashboard::landing_for(row.as_ref())))
}

/// `/customer`, `/seller`, `/admin` and everything below them. The stored
/// role is read fresh on every request.
#[instrument(name = "page::role_dashboard", skip_all, fields(path = %req.path()))]
pub async fn role_dashboard_page(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  user: MaybeUser,
) -> Result<HttpResponse, AppError> {
  let path = req.path().trim_start_matches('/');
  let (segment, section) = path.split_once('/').unwrap_or((path, ""));
  let segment: Role = segment
    .parse()
    .map_err(|_| AppError::NotFound(format!("No dashboard at /{}", segment)))?;

  let auth_user = user.0.as_ref().map(|s| &s.user);
  let row = match auth_user {
    Some(u) => users::fetch_user_row(&app_state.hosted, u.id).await?,
    None => None,
  };

  match dashboard::resolve_dashboard(auth_user, row.as_ref(), segment, section) {
    DashboardRoute::Redirect(location) => {
      debug!(%location, "Dashboard redirect.");
      Ok(temporary_redirect(&location))
    }
    DashboardRoute::Render(shell) => Ok(HttpResponse::Ok().json(shell)),
  }
}

// app/src/web/handlers/auth_handlers.rs

use actix_web::http::header::LOCATION;
use actix_web::{web, HttpRequest, HttpResponse, HttpResponseBuilder};
use serde::Deserialize;
use serde_json::json;
use stepflow::{ContextData, PipelineResult};
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::hosted::{AuthSession, OtpKind};
use crate::models::Role;
use crate::pipelines::contexts::{SigninCtxData, SignupCtxData};
use crate::services::auth_service::{self, CompleteProfileInput};
use crate::state::AppState;
use crate::web::dashboard;
use crate::web::extractors::{AuthenticatedUser, MaybeUser};
use crate::web::session;

// --- Request DTOs ---
#[derive(Deserialize, Debug)]
pub struct SignupRequestPayload {
  pub email: String,
  pub password: String,
  pub full_name: String,
  #[serde(default = "default_role")]
  pub role: Role,
  pub store_name: Option<String>,
}

fn default_role() -> Role {
  Role::Customer
}

#[derive(Deserialize, Debug)]
pub struct SigninRequestPayload {
  pub email: String,
  pub password: String,
  pub redirect: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct EmailPayload {
  pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct ResetPasswordPayload {
  pub password: String,
  pub confirm_password: String,
}

#[derive(Deserialize, Debug)]
pub struct ConfirmQuery {
  pub email: String,
  pub token: String,
  #[serde(rename = "type")]
  pub kind: OtpKind,
  pub next: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct RedirectQuery {
  pub redirect: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CallbackQuery {
  pub code: Option<String>,
  pub next: Option<String>,
  pub error_description: Option<String>,
}

fn see_other(location: &str) -> HttpResponseBuilder {
  let mut builder = HttpResponse::SeeOther();
  builder.insert_header((LOCATION, location.to_string()));
  builder
}

/// Redirects to `location` and stores the session's cookies.
fn signed_in_redirect(state: &AppState, auth_session: &AuthSession, location: &str) -> HttpResponse {
  let mut builder = see_other(location);
  for cookie in session::session_cookies(&state.config, auth_session) {
    builder.cookie(cookie);
  }
  builder.json(json!({ "message": "Signed in.", "redirect": location }))
}

// --- Handler Implementations ---

#[instrument(
    name = "handler::signup",
    skip(app_state, req_payload),
    fields(req_email = %req_payload.email, role = %req_payload.role)
)]
pub async fn signup_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SignupRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let ctx_data = ContextData::new(SignupCtxData::new(
    app_state.get_ref().clone(),
    payload.email,
    payload.password,
    payload.full_name,
    payload.role,
    payload.store_name,
  ));

  match app_state.flows.signup.run(ctx_data.clone()).await {
    Ok(PipelineResult::Completed) => {
      let (user_id, auth_session, role) = {
        let guard = ctx_data.read();
        let user_id = guard
          .created_user
          .as_ref()
          .map(|u| u.id)
          .ok_or_else(|| AppError::Internal("Sign-up completed without creating a user.".to_string()))?;
        (user_id, guard.session.clone(), guard.role)
      };
      info!(%user_id, "Sign-up completed.");

      match auth_session {
        Some(auth_session) => Ok(signed_in_redirect(&app_state, &auth_session, role.root_path())),
        None => Ok(HttpResponse::Created().json(json!({
          "message": "Check your email to confirm your account.",
          "userId": user_id.to_string(),
        }))),
      }
    }
    Ok(PipelineResult::Stopped) => {
      warn!("Sign-up pipeline was stopped by a handler.");
      Err(AppError::PipelineHaltedByHandler)
    }
    Err(app_err) => {
      warn!(error = %app_err, "Sign-up failed.");
      Err(app_err)
    }
  }
}

#[instrument(
    name = "handler::signin",
    skip(app_state, req_payload),
    fields(req_email = %req_payload.email)
)]
pub async fn signin_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SigninRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let ctx_data = ContextData::new(SigninCtxData::new(app_state.get_ref().clone(), payload.email, payload.password));

  match app_state.flows.signin.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let (auth_session, landing) = {
        let guard = ctx_data.read();
        let auth_session = guard
          .session
          .clone()
          .ok_or_else(|| AppError::Auth("Sign-in completed without a session.".to_string()))?;
        (auth_session, dashboard::landing_for(guard.user_row.as_ref()))
      };
      let location = match payload.redirect.as_deref() {
        Some(next) => auth_service::safe_redirect(Some(next)),
        None => landing.to_string(),
      };
      info!(user_id = %auth_session.user.id, %location, "Sign-in succeeded.");
      Ok(signed_in_redirect(&app_state, &auth_session, &location))
    }
    PipelineResult::Stopped => Err(AppError::PipelineHaltedByHandler),
  }
}

#[instrument(name = "handler::signout", skip_all)]
pub async fn signout_handler(app_state: web::Data<AppState>, user: MaybeUser) -> HttpResponse {
  if let Some(current) = &user.0 {
    auth_service::sign_out(&app_state.hosted, &current.access_token).await;
  }
  let mut builder = see_other("/login");
  for cookie in session::removal_cookies(&app_state.config) {
    builder.cookie(cookie);
  }
  builder.json(json!({ "message": "Signed out." }))
}

#[instrument(name = "handler::forgot_password", skip_all)]
pub async fn forgot_password_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<EmailPayload>,
) -> Result<HttpResponse, AppError> {
  auth_service::request_password_reset(&app_state.hosted, &app_state.config, &req_payload.email).await?;
  Ok(HttpResponse::Ok().json(json!({
    "message": "If an account exists for that address, a reset link is on its way."
  })))
}

#[instrument(name = "handler::reset_password", skip_all, fields(user_id = %auth_user.id()))]
pub async fn reset_password_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<ResetPasswordPayload>,
) -> Result<HttpResponse, AppError> {
  auth_service::update_password(
    &app_state.hosted,
    auth_user.access_token(),
    &req_payload.password,
    &req_payload.confirm_password,
  )
  .await?;
  Ok(see_other("/dashboard").json(json!({ "message": "Password updated." })))
}

/// Landing point of emailed confirmation and recovery links.
#[instrument(name = "handler::confirm", skip(app_state, query), fields(kind = ?query.kind))]
pub async fn confirm_handler(app_state: web::Data<AppState>, query: web::Query<ConfirmQuery>) -> Result<HttpResponse, AppError> {
  let auth_session = auth_service::verify_email_link(&app_state.hosted, &query.email, &query.token, query.kind).await?;
  let location = match (query.kind, query.next.as_deref()) {
    (OtpKind::Recovery, None) => "/reset-password".to_string(),
    (_, next) => auth_service::safe_redirect(next),
  };
  Ok(signed_in_redirect(&app_state, &auth_session, &location))
}

#[instrument(name = "handler::oauth_start", skip(app_state, query))]
pub async fn oauth_start_handler(
  app_state: web::Data<AppState>,
  provider: web::Path<String>,
  query: web::Query<RedirectQuery>,
) -> Result<HttpResponse, AppError> {
  let (authorize_url, verifier) =
    auth_service::oauth_start(&app_state.hosted, &app_state.config, &provider, query.redirect.as_deref())?;
  Ok(
    see_other(&authorize_url)
      .cookie(session::verifier_cookie(&app_state.config, &verifier))
      .finish(),
  )
}

#[instrument(name = "handler::oauth_callback", skip_all)]
pub async fn oauth_callback_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  query: web::Query<CallbackQuery>,
) -> Result<HttpResponse, AppError> {
  let Some(code) = query.code.as_deref() else {
    let reason = query.error_description.as_deref().unwrap_or("Sign-in was cancelled.");
    warn!(%reason, "OAuth callback without code.");
    return Ok(see_other(&format!("/login?error={}", urlencoding::encode(reason))).finish());
  };

  let verifier = req
    .cookie(&app_state.config.code_verifier_cookie_name())
    .map(|c| c.value().to_string());
  let auth_session = auth_service::exchange_oauth_code(&app_state.hosted, code, verifier.as_deref()).await?;

  let mut response = signed_in_redirect(&app_state, &auth_session, &auth_service::safe_redirect(query.next.as_deref()));
  let removal = session::removal_cookie(&app_state.config, app_state.config.code_verifier_cookie_name());
  if let Err(e) = response.add_cookie(&removal) {
    warn!(error = %e, "Could not clear verifier cookie.");
  }
  Ok(response)
}

#[instrument(name = "handler::complete_profile", skip_all, fields(user_id = %auth_user.id()))]
pub async fn complete_profile_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<CompleteProfileInput>,
) -> Result<HttpResponse, AppError> {
  let row = auth_service::complete_profile(&app_state.hosted, auth_user.user(), req_payload.into_inner()).await?;
  let location = row.role.root_path();
  Ok(see_other(location).json(json!({ "message": "Profile completed.", "redirect": location })))
}

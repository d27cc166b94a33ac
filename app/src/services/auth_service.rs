// app/src/services/auth_service.rs

//! Account operations over the hosted auth provider: the current user view,
//! sign-out, profile edits, password reset, email links and OAuth. Sign-up
//! and sign-in run as pipelines (see `pipelines`).

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::hosted::{AuthSession, AuthUser, Hosted, OtpKind, UserAttributes};
use crate::models::{Profile, Role, UserRow};
use crate::services::users;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const OAUTH_PROVIDERS: &[&str] = &["google", "github"];
pub const DEFAULT_LANDING: &str = "/dashboard";

/// The signed-in user as screens see it. `role` is absent until the user
/// has a `users` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentUser {
  pub id: Uuid,
  pub email: String,
  pub full_name: Option<String>,
  pub role: Option<Role>,
  pub avatar_url: Option<String>,
}

impl CurrentUser {
  pub fn from_parts(user: &AuthUser, row: Option<&UserRow>) -> Self {
    let metadata_name = user
      .user_metadata
      .get("full_name")
      .and_then(|v| v.as_str())
      .map(str::to_string);
    Self {
      id: user.id,
      email: user.email.clone(),
      full_name: row.and_then(|r| r.full_name.clone()).or(metadata_name),
      role: row.map(|r| r.role),
      avatar_url: row.and_then(|r| r.avatar_url.clone()),
    }
  }
}

pub fn validate_email(email: &str) -> Result<()> {
  let email = email.trim();
  let valid = match email.split_once('@') {
    Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'),
    None => false,
  };
  if valid {
    Ok(())
  } else {
    Err(AppError::Validation("Please enter a valid email address.".to_string()))
  }
}

pub fn validate_password(password: &str) -> Result<()> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(AppError::Validation(format!(
      "Password must be at least {} characters.",
      MIN_PASSWORD_LEN
    )));
  }
  Ok(())
}

/// Only same-site absolute paths are followed after sign-in. Browsers drop
/// tabs and newlines while parsing a URL, so any control or whitespace
/// character rejects the path.
pub fn safe_redirect(next: Option<&str>) -> String {
  match next {
    Some(path)
      if path.starts_with('/')
        && !path.starts_with("//")
        && !path.contains('\\')
        && !path.chars().any(|c| c.is_control() || c.is_whitespace()) =>
    {
      path.to_string()
    }
    _ => DEFAULT_LANDING.to_string(),
  }
}

#[instrument(name = "auth_service::current_user", skip(hosted, user), fields(user_id = %user.id), err(Display))]
pub async fn current_user(hosted: &Hosted, user: &AuthUser) -> Result<CurrentUser> {
  let row = users::fetch_user_row(hosted, user.id).await?;
  Ok(CurrentUser::from_parts(user, row.as_ref()))
}

/// Revokes the hosted session. Failures are logged; the caller clears
/// cookies either way.
#[instrument(name = "auth_service::sign_out", skip_all)]
pub async fn sign_out(hosted: &Hosted, access_token: &str) {
  if let Err(e) = hosted.auth.sign_out(access_token).await {
    warn!(error = %e, "Hosted sign-out failed; clearing local session anyway.");
  }
}

/// Creates the row that accompanies a role: a profile for customers, a store
/// for sellers. Admin rows are provisioned by other admins and get neither.
pub async fn create_companion_row(hosted: &Hosted, user_id: Uuid, role: Role, store_name: Option<&str>) -> Result<()> {
  match role {
    Role::Customer => {
      users::upsert_profile(hosted, &Profile { id: user_id, ..Default::default() }).await?;
    }
    Role::Seller => {
      let store_name = store_name
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("Sellers must choose a store name.".to_string()))?;
      users::insert_seller(hosted, user_id, store_name).await?;
    }
    Role::Admin => {}
  }
  Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompleteProfileInput {
  pub full_name: String,
  pub role: Role,
  pub store_name: Option<String>,
}

/// Creates the `users` row for an authenticated user who has none, e.g.
/// after an OAuth sign-in.
#[instrument(name = "auth_service::complete_profile", skip(hosted, user, input), fields(user_id = %user.id, role = %input.role), err(Display))]
pub async fn complete_profile(hosted: &Hosted, user: &AuthUser, input: CompleteProfileInput) -> Result<UserRow> {
  if !input.role.is_self_assignable() {
    return Err(AppError::Forbidden(format!("The {} role cannot be self-assigned.", input.role)));
  }
  if input.full_name.trim().is_empty() {
    return Err(AppError::Validation("Full name is required.".to_string()));
  }
  if users::fetch_user_row(hosted, user.id).await?.is_some() {
    return Err(AppError::Conflict("Profile is already complete.".to_string()));
  }
  if input.role == Role::Seller && input.store_name.as_deref().map_or(true, |s| s.trim().is_empty()) {
    return Err(AppError::Validation("Sellers must choose a store name.".to_string()));
  }

  let row = users::insert_user_row(hosted, user.id, &user.email, Some(input.full_name.trim()), input.role).await?;
  create_companion_row(hosted, user.id, input.role, input.store_name.as_deref()).await?;
  info!("Profile completed.");
  Ok(row)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
  pub full_name: Option<String>,
  pub phone: Option<String>,
  pub address_line: Option<String>,
  pub city: Option<String>,
  pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
  pub user: CurrentUser,
  pub profile: Option<Profile>,
}

pub async fn profile_view(hosted: &Hosted, user: &AuthUser) -> Result<ProfileView> {
  Ok(ProfileView {
    user: current_user(hosted, user).await?,
    profile: users::fetch_profile(hosted, user.id).await?,
  })
}

/// Writes the name to the auth metadata and the `users` row, and contact
/// details to `profiles`.
#[instrument(name = "auth_service::update_profile", skip(hosted, access_token, user, update), fields(user_id = %user.id), err(Display))]
pub async fn update_profile(hosted: &Hosted, access_token: &str, user: &AuthUser, update: ProfileUpdate) -> Result<ProfileView> {
  let row = users::require_user_row(hosted, user.id).await?;
  let mut auth_user = user.clone();

  if let Some(full_name) = update.full_name.as_deref().map(str::trim) {
    if full_name.is_empty() {
      return Err(AppError::Validation("Full name cannot be blank.".to_string()));
    }
    let attributes = UserAttributes {
      metadata: Some(json!({ "full_name": full_name })),
      ..Default::default()
    };
    auth_user = hosted.auth.update_user(access_token, &attributes).await?;
    users::update_user_row(hosted, user.id, json!({ "full_name": full_name })).await?;
  }

  let mut profile = users::fetch_profile(hosted, user.id).await?.unwrap_or(Profile {
    id: user.id,
    ..Default::default()
  });
  let touches_profile = update.phone.is_some() || update.address_line.is_some() || update.city.is_some() || update.country.is_some();
  if touches_profile {
    profile.phone = update.phone.or(profile.phone);
    profile.address_line = update.address_line.or(profile.address_line);
    profile.city = update.city.or(profile.city);
    profile.country = update.country.or(profile.country);
    profile = users::upsert_profile(hosted, &profile).await?;
  }
  debug!(role = %row.role, "Profile updated.");

  Ok(ProfileView {
    user: current_user(hosted, &auth_user).await?,
    profile: Some(profile),
  })
}

pub async fn set_avatar_url(hosted: &Hosted, user_id: Uuid, url: &str) -> Result<UserRow> {
  users::update_user_row(hosted, user_id, json!({ "avatar_url": url })).await
}

/// Sends a reset email. Unknown addresses and upstream failures look the same
/// to the caller.
#[instrument(name = "auth_service::request_password_reset", skip(hosted, config), err(Display))]
pub async fn request_password_reset(hosted: &Hosted, config: &AppConfig, email: &str) -> Result<()> {
  validate_email(email)?;
  let redirect_to = format!("{}/auth/confirm?next=/reset-password", config.app_base_url);
  if let Err(e) = hosted.auth.send_password_reset(email.trim(), &redirect_to).await {
    warn!(error = %e, "Password reset request was not accepted upstream.");
  }
  Ok(())
}

#[instrument(name = "auth_service::update_password", skip_all, err(Display))]
pub async fn update_password(hosted: &Hosted, access_token: &str, password: &str, confirm: &str) -> Result<()> {
  validate_password(password)?;
  if password != confirm {
    return Err(AppError::Validation("Passwords do not match.".to_string()));
  }
  let attributes = UserAttributes {
    password: Some(password.to_string()),
    ..Default::default()
  };
  hosted.auth.update_user(access_token, &attributes).await?;
  info!("Password updated.");
  Ok(())
}

/// Verifies an emailed one-time token (confirmation or recovery link).
#[instrument(name = "auth_service::verify_email_link", skip(hosted, token), err(Display))]
pub async fn verify_email_link(hosted: &Hosted, email: &str, token: &str, kind: OtpKind) -> Result<AuthSession> {
  if token.is_empty() {
    return Err(AppError::Validation("The link is missing its token.".to_string()));
  }
  Ok(hosted.auth.verify_otp(email, token, kind).await?)
}

pub fn new_code_verifier() -> String {
  format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Authorization URL for an OAuth provider plus the verifier the callback
/// must present.
pub fn oauth_start(hosted: &Hosted, config: &AppConfig, provider: &str, next: Option<&str>) -> Result<(String, String)> {
  if !OAUTH_PROVIDERS.contains(&provider) {
    return Err(AppError::Validation(format!("Unsupported sign-in provider '{}'.", provider)));
  }
  let verifier = new_code_verifier();
  let callback = format!(
    "{}/auth/callback?next={}",
    config.app_base_url,
    urlencoding::encode(&safe_redirect(next))
  );
  Ok((hosted.auth.oauth_authorize_url(provider, &callback, &verifier), verifier))
}

#[instrument(name = "auth_service::exchange_oauth_code", skip_all, err(Display))]
pub async fn exchange_oauth_code(hosted: &Hosted, code: &str, verifier: Option<&str>) -> Result<AuthSession> {
  let verifier = verifier.ok_or_else(|| AppError::Auth("Sign-in attempt expired. Please try again.".to_string()))?;
  Ok(hosted.auth.exchange_code_for_session(code, verifier).await?)
}

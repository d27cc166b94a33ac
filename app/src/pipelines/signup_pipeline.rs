// app/src/pipelines/signup_pipeline.rs

use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::contexts::SignupCtxData;
use crate::services::{auth_service, users};
use serde_json::json;
use stepflow::{ContextData, Pipeline, PipelineControl};
use tracing::{event, info, warn, Level};

pub const STEPS: [&str; 4] = ["validate_signup_input", "create_auth_user", "insert_user_row", "insert_role_row"];

/// Builds the sign-up flow. Creating the auth user is undone (best effort)
/// when a later table write fails, so a failed registration can be retried
/// with the same address.
pub fn build_signup_pipeline() -> Pipeline<SignupCtxData, AppError> {
  let mut p = Pipeline::<SignupCtxData, AppError>::new(&[
    (STEPS[0], false, None),
    (STEPS[1], false, None),
    (STEPS[2], false, None),
    (STEPS[3], false, None),
  ]);

  p.on(STEPS[0], validate_signup_input);
  p.on(STEPS[1], create_auth_user);
  p.compensate(STEPS[1], delete_auth_user);
  p.on(STEPS[2], insert_user_row);
  p.compensate(STEPS[2], delete_user_row);
  p.on(STEPS[3], insert_role_row);

  info!("Sign-up pipeline built.");
  p
}

async fn validate_signup_input(ctx_data: ContextData<SignupCtxData>) -> AppResult<PipelineControl> {
  let (email, password, full_name, role, store_name) = {
    let guard = ctx_data.read();
    (
      guard.email.trim().to_string(),
      guard.password.clone(),
      guard.full_name.trim().to_string(),
      guard.role,
      guard.store_name.clone(),
    )
  };

  event!(Level::DEBUG, %email, %role, "Validating sign-up input.");
  auth_service::validate_email(&email)?;
  auth_service::validate_password(&password)?;
  if full_name.is_empty() {
    return Err(AppError::Validation("Full name is required.".to_string()));
  }
  if !role.is_self_assignable() {
    warn!(%role, "Sign-up attempted with a reserved role.");
    return Err(AppError::Forbidden(format!("The {} role cannot be self-assigned.", role)));
  }
  if role == crate::models::Role::Seller && store_name.as_deref().map_or(true, |s| s.trim().is_empty()) {
    return Err(AppError::Validation("Sellers must choose a store name.".to_string()));
  }

  ctx_data.update(|d| {
    d.email = email;
    d.full_name = full_name;
  });
  Ok(PipelineControl::Continue)
}

async fn create_auth_user(ctx_data: ContextData<SignupCtxData>) -> AppResult<PipelineControl> {
  let (hosted, email, password, metadata) = {
    let guard = ctx_data.read();
    (
      guard.app_state.hosted.clone(),
      guard.email.clone(),
      guard.password.clone(),
      json!({ "full_name": guard.full_name, "role": guard.role }),
    )
  };

  let outcome = hosted.auth.sign_up(&email, &password, metadata).await?;
  info!(user_id = %outcome.user.id, confirmed = outcome.session.is_some(), "Auth user created.");
  ctx_data.update(|d| {
    d.created_user = Some(outcome.user);
    d.session = outcome.session;
  });
  Ok(PipelineControl::Continue)
}

async fn delete_auth_user(ctx_data: ContextData<SignupCtxData>) -> AppResult<()> {
  let (hosted, user_id) = {
    let guard = ctx_data.read();
    (guard.app_state.hosted.clone(), guard.created_user.as_ref().map(|u| u.id))
  };
  let Some(user_id) = user_id else {
    return Ok(());
  };
  warn!(%user_id, "Removing auth user after failed registration.");
  hosted.auth.delete_user(user_id).await?;
  Ok(())
}

async fn insert_user_row(ctx_data: ContextData<SignupCtxData>) -> AppResult<PipelineControl> {
  let (hosted, user, full_name, role) = {
    let guard = ctx_data.read();
    (
      guard.app_state.hosted.clone(),
      guard.created_user.clone(),
      guard.full_name.clone(),
      guard.role,
    )
  };
  let user = user.ok_or_else(|| AppError::Internal("auth user missing before users row insert".to_string()))?;

  let row = users::insert_user_row(&hosted, user.id, &user.email, Some(&full_name), role).await?;
  event!(Level::DEBUG, user_id = %row.id, role = %row.role, "users row inserted.");
  ctx_data.write().user_row = Some(row);
  Ok(PipelineControl::Continue)
}

async fn delete_user_row(ctx_data: ContextData<SignupCtxData>) -> AppResult<()> {
  let (hosted, user_id) = {
    let guard = ctx_data.read();
    (guard.app_state.hosted.clone(), guard.user_row.as_ref().map(|r| r.id))
  };
  if let Some(user_id) = user_id {
    users::delete_user_row(&hosted, user_id).await?;
  }
  Ok(())
}

async fn insert_role_row(ctx_data: ContextData<SignupCtxData>) -> AppResult<PipelineControl> {
  let (hosted, user_id, role, store_name) = {
    let guard = ctx_data.read();
    (
      guard.app_state.hosted.clone(),
      guard.created_user.as_ref().map(|u| u.id),
      guard.role,
      guard.store_name.clone(),
    )
  };
  let user_id = user_id.ok_or_else(|| AppError::Internal("auth user missing before role row insert".to_string()))?;
  auth_service::create_companion_row(&hosted, user_id, role, store_name.as_deref()).await?;
  Ok(PipelineControl::Continue)
}

// app/src/pipelines/signin_pipeline.rs

use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::contexts::SigninCtxData;
use crate::services::{auth_service, users};
use stepflow::{ContextData, Pipeline, PipelineControl};
use tracing::{event, info, warn, Level};

pub fn build_signin_pipeline() -> Pipeline<SigninCtxData, AppError> {
  let mut p = Pipeline::<SigninCtxData, AppError>::new(&[
    ("validate_signin_input", false, None),
    ("password_grant", false, None),
    // A missing users row is not fatal; the dashboard sends the user to
    // complete their profile.
    ("load_user_row", true, None),
  ]);

  p.on("validate_signin_input", |ctx_data: ContextData<SigninCtxData>| async move {
    let (email, password_empty) = {
      let guard = ctx_data.read();
      (guard.email.trim().to_string(), guard.password.is_empty())
    };
    auth_service::validate_email(&email)?;
    if password_empty {
      return Err(AppError::Validation("Password is required.".to_string()));
    }
    ctx_data.write().email = email;
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  p.on("password_grant", password_grant);
  p.on("load_user_row", load_user_row);

  info!("Sign-in pipeline built.");
  p
}

async fn password_grant(ctx_data: ContextData<SigninCtxData>) -> AppResult<PipelineControl> {
  let (hosted, email, password) = {
    let guard = ctx_data.read();
    (guard.app_state.hosted.clone(), guard.email.clone(), guard.password.clone())
  };

  match hosted.auth.sign_in_with_password(&email, &password).await {
    Ok(session) => {
      event!(Level::DEBUG, user_id = %session.user.id, "Password grant succeeded.");
      ctx_data.write().session = Some(session);
      Ok(PipelineControl::Continue)
    }
    Err(e) => {
      warn!(%email, error = %e, "Password grant failed.");
      // One message for unknown address and wrong password.
      Err(match AppError::from(e) {
        AppError::Auth(_) => AppError::Auth("Invalid email or password.".to_string()),
        other => other,
      })
    }
  }
}

async fn load_user_row(ctx_data: ContextData<SigninCtxData>) -> AppResult<PipelineControl> {
  let (hosted, user_id) = {
    let guard = ctx_data.read();
    (guard.app_state.hosted.clone(), guard.session.as_ref().map(|s| s.user.id))
  };
  let Some(user_id) = user_id else {
    return Ok(PipelineControl::Continue);
  };
  let row = users::fetch_user_row(&hosted, user_id).await?;
  if row.is_none() {
    info!(%user_id, "Signed-in user has no users row yet.");
  }
  ctx_data.write().user_row = row;
  Ok(PipelineControl::Continue)
}

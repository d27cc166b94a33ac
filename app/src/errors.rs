// app/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use stepflow::FlowError;
use thiserror::Error;

use crate::hosted::HostedError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Payment Processing Error: {0}")]
  Payment(String),

  #[error("Hosted Service Error: {0}")]
  Hosted(HostedError),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),

  // A flow that is expected to complete was stopped by one of its steps.
  #[error("Process was halted before completion.")]
  PipelineHaltedByHandler,
}

// Rejections that carry a meaning for the caller keep it; everything else is
// an upstream failure.
impl From<HostedError> for AppError {
  fn from(err: HostedError) -> Self {
    match err {
      HostedError::Unauthorized(m) => AppError::Auth(m),
      HostedError::NotFound(m) => AppError::NotFound(m),
      HostedError::Conflict(m) => AppError::Conflict(m),
      other => AppError::Hosted(other),
    }
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<AppError>() {
      Ok(app_err) => app_err,
      Err(err) => match err.downcast::<HostedError>() {
        Ok(hosted_err) => hosted_err.into(),
        Err(err) => AppError::Internal(err.to_string()),
      },
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> actix_web::http::StatusCode {
    use actix_web::http::StatusCode;
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) | AppError::PipelineHaltedByHandler => StatusCode::CONFLICT,
      AppError::Payment(_) => StatusCode::PAYMENT_REQUIRED,
      AppError::Hosted(_) => StatusCode::BAD_GATEWAY,
      AppError::Config(_) | AppError::Workflow { .. } | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    let body = match self {
      AppError::Validation(m)
      | AppError::Auth(m)
      | AppError::Forbidden(m)
      | AppError::NotFound(m)
      | AppError::Conflict(m)
      | AppError::Payment(m) => json!({ "error": m }),
      AppError::Hosted(e) => json!({ "error": "Hosted service request failed", "detail": e.to_string() }),
      AppError::Config(m) => json!({ "error": "Configuration issue", "detail": m }),
      AppError::Workflow { source } => {
        tracing::error!(workflow_error_source = ?source, "Workflow error details");
        json!({ "error": "Workflow processing error", "detail": source.to_string() })
      }
      AppError::Internal(m) => json!({ "error": "An internal error occurred", "detail": m }),
      AppError::PipelineHaltedByHandler => json!({ "error": self.to_string() }),
    };
    HttpResponse::build(self.status_code()).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::http::StatusCode;

  #[test]
  fn hosted_rejections_keep_their_meaning() {
    let err: AppError = HostedError::Unauthorized("jwt expired".into()).into();
    assert!(matches!(err, AppError::Auth(_)));
    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

    let err: AppError = HostedError::Rejected { status: 500, message: "boom".into() }.into();
    assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
  }

  #[test]
  fn anyhow_wrapping_an_app_error_is_unwrapped() {
    let err: AppError = anyhow::Error::new(AppError::NotFound("product".into())).into();
    assert!(matches!(err, AppError::NotFound(m) if m == "product"));
  }
}

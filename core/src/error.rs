// core/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
  #[error("step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("non-optional step '{step_name}' has no handler")]
  HandlerMissing { step_name: String },

  #[error("handler failed: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("internal stepflow error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    match err.downcast::<FlowError>() {
      Ok(flow_err) => flow_err,
      Err(source) => FlowError::HandlerError { source },
    }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;

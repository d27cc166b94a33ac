// app/src/pipelines/mod.rs

//! Multi-call flows run as `stepflow` pipelines. Each is built once at
//! startup and shared through `AppState`.

use crate::errors::AppError;
use stepflow::Pipeline;

pub mod checkout_pipeline;
pub mod contexts;
pub mod signin_pipeline;
pub mod signup_pipeline;

use contexts::{CheckoutCtxData, SigninCtxData, SignupCtxData};

pub struct Flows {
  pub signup: Pipeline<SignupCtxData, AppError>,
  pub signin: Pipeline<SigninCtxData, AppError>,
  pub checkout: Pipeline<CheckoutCtxData, AppError>,
}

impl Flows {
  pub fn build() -> Self {
    tracing::info!("Building application pipelines...");
    let flows = Self {
      signup: signup_pipeline::build_signup_pipeline(),
      signin: signin_pipeline::build_signin_pipeline(),
      checkout: checkout_pipeline::build_checkout_pipeline(),
    };
    tracing::info!("All application pipelines built.");
    flows
  }
}

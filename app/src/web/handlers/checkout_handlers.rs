// app/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use stepflow::{ContextData, PipelineResult};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::services::orders;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct CheckoutRequestPayload {
  pub shipping_address: String,
  pub payment_method: String,
}

#[instrument(
    name = "handler::checkout",
    skip(app_state, req_payload, auth_user),
    fields(user_id = %auth_user.id())
)]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<CheckoutRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let ctx_data = ContextData::new(CheckoutCtxData::new(
    app_state.get_ref().clone(),
    auth_user.id(),
    payload.shipping_address,
    payload.payment_method,
  ));

  match app_state.flows.checkout.run(ctx_data.clone()).await {
    Ok(PipelineResult::Completed) => {
      let guard = ctx_data.read();
      let order = guard
        .order
        .clone()
        .ok_or_else(|| AppError::Internal("Checkout completed without an order.".to_string()))?;
      info!(order_id = %order.id, total_cents = order.total_cents, "Checkout completed.");
      Ok(HttpResponse::Created().json(json!({
          "order": order,
          "items": guard.items,
          "paymentReference": guard.payment.as_ref().map(|p| p.reference.clone()),
      })))
    }
    Ok(PipelineResult::Stopped) => Err(AppError::PipelineHaltedByHandler),
    Err(app_err) => {
      warn!(error = %app_err, "Checkout failed.");
      Err(app_err)
    }
  }
}

#[instrument(name = "handler::list_orders", skip_all, fields(user_id = %auth_user.id()))]
pub async fn list_orders_handler(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let orders = orders::orders_for_customer(&app_state.hosted, auth_user.id()).await?;
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}

#[instrument(name = "handler::get_order", skip(app_state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = orders::order_for_customer(&app_state.hosted, auth_user.id(), path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(order))
}

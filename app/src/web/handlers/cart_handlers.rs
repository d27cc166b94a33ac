// app/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::cart::{self, CartView};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct AddToCartRequestPayload {
  pub product_id: Uuid,
  #[serde(default = "one")]
  pub quantity: u32,
}

fn one() -> u32 {
  1
}

#[derive(Deserialize, Debug)]
pub struct SetQuantityPayload {
  pub quantity: u32,
}

fn view(app_state: &AppState, cart: &cart::Cart) -> HttpResponse {
  HttpResponse::Ok().json(CartView::of(cart, &app_state.config.currency))
}

#[instrument(name = "handler::get_cart", skip_all, fields(user_id = %auth_user.id()))]
pub async fn get_cart_handler(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> HttpResponse {
  view(&app_state, &app_state.carts.get(auth_user.id()))
}

#[instrument(
    name = "handler::add_to_cart",
    skip(app_state, req_payload, auth_user),
    fields(user_id = %auth_user.id(), product_id = %req_payload.product_id, quantity = req_payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<AddToCartRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let cart = cart::add_product(
    &app_state.hosted,
    &app_state.carts,
    auth_user.id(),
    req_payload.product_id,
    req_payload.quantity,
  )
  .await?;
  Ok(view(&app_state, &cart))
}

#[instrument(name = "handler::set_cart_quantity", skip(app_state, auth_user, req_payload), fields(user_id = %auth_user.id()))]
pub async fn set_quantity_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<SetQuantityPayload>,
) -> Result<HttpResponse, AppError> {
  let cart = cart::set_quantity(
    &app_state.hosted,
    &app_state.carts,
    auth_user.id(),
    path.into_inner(),
    req_payload.quantity,
  )
  .await?;
  Ok(view(&app_state, &cart))
}

#[instrument(name = "handler::remove_from_cart", skip(app_state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn remove_from_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let cart = app_state.carts.with_cart(auth_user.id(), |cart| {
    if cart.remove(product_id) {
      Ok(cart.clone())
    } else {
      Err(AppError::NotFound(format!("Product {} is not in the cart.", product_id)))
    }
  })?;
  Ok(view(&app_state, &cart))
}

#[instrument(name = "handler::clear_cart", skip_all, fields(user_id = %auth_user.id()))]
pub async fn clear_cart_handler(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> HttpResponse {
  app_state.carts.clear(auth_user.id());
  view(&app_state, &cart::Cart::new())
}

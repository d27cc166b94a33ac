// app/src/web/handlers/wishlist_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::{catalog, wishlist};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct WishlistPayload {
  pub product_id: Uuid,
}

/// Wishlist rows joined with their products. Rows whose product is gone are
/// listed with a null product.
#[instrument(name = "handler::list_wishlist", skip_all, fields(user_id = %auth_user.id()))]
pub async fn list_wishlist_handler(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let items = wishlist::list(&app_state.hosted, auth_user.id()).await?;
  let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
  let mut products: HashMap<_, _> = catalog::products_by_ids(&app_state.hosted, &ids)
    .await?
    .into_iter()
    .map(|p| (p.id, p))
    .collect();

  let entries: Vec<_> = items
    .into_iter()
    .map(|item| {
      let product = products.remove(&item.product_id);
      json!({ "item": item, "product": product })
    })
    .collect();
  Ok(HttpResponse::Ok().json(json!({ "wishlist": entries })))
}

#[instrument(name = "handler::add_to_wishlist", skip(app_state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn add_to_wishlist_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<WishlistPayload>,
) -> Result<HttpResponse, AppError> {
  // The product must exist.
  catalog::get_product(&app_state.hosted, req_payload.product_id).await?;
  let item = wishlist::add(&app_state.hosted, auth_user.id(), req_payload.product_id).await?;
  Ok(HttpResponse::Created().json(item))
}

#[instrument(name = "handler::remove_from_wishlist", skip(app_state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn remove_from_wishlist_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  wishlist::remove(&app_state.hosted, auth_user.id(), path.into_inner()).await?;
  Ok(HttpResponse::NoContent().finish())
}

// app/src/web/handlers/seller_handlers.rs

//! Seller back office. Every handler resolves the caller's seller row first;
//! product reads and writes are then restricted to that seller's rows.

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Role, Seller};
use crate::services::catalog::{self, ProductInput, ProductPatch};
use crate::services::{orders, storage, users};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use crate::web::handlers::profile_handlers::content_type;

async fn current_seller(app_state: &AppState, auth_user: &AuthenticatedUser) -> Result<Seller, AppError> {
  users::require_role(&app_state.hosted, auth_user.id(), Role::Seller).await?;
  users::require_seller(&app_state.hosted, auth_user.id()).await
}

#[instrument(name = "handler::seller_store", skip_all, fields(user_id = %auth_user.id()))]
pub async fn store_handler(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let seller = current_seller(&app_state, &auth_user).await?;
  Ok(HttpResponse::Ok().json(seller))
}

#[instrument(name = "handler::seller_products", skip_all, fields(user_id = %auth_user.id()))]
pub async fn list_products_handler(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let seller = current_seller(&app_state, &auth_user).await?;
  let products = catalog::seller_products(&app_state.hosted, &seller).await?;
  Ok(HttpResponse::Ok().json(json!({ "products": products })))
}

#[instrument(name = "handler::seller_create_product", skip_all, fields(user_id = %auth_user.id()))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<ProductInput>,
) -> Result<HttpResponse, AppError> {
  let seller = current_seller(&app_state, &auth_user).await?;
  let product = catalog::create_product(&app_state.hosted, &seller, req_payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(product))
}

#[instrument(name = "handler::seller_update_product", skip(app_state, auth_user, req_payload), fields(user_id = %auth_user.id()))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<ProductPatch>,
) -> Result<HttpResponse, AppError> {
  let seller = current_seller(&app_state, &auth_user).await?;
  let product = catalog::update_product(&app_state.hosted, &seller, path.into_inner(), req_payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::seller_delete_product", skip(app_state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let seller = current_seller(&app_state, &auth_user).await?;
  catalog::delete_product(&app_state.hosted, &seller, path.into_inner()).await?;
  Ok(HttpResponse::NoContent().finish())
}

#[instrument(name = "handler::seller_product_image", skip(app_state, auth_user, req, body), fields(user_id = %auth_user.id()))]
pub async fn upload_product_image_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let seller = current_seller(&app_state, &auth_user).await?;
  let product_id = path.into_inner();
  // Check ownership before anything is uploaded.
  let product = catalog::get_product(&app_state.hosted, product_id).await?;
  if product.seller_id != seller.id {
    return Err(AppError::NotFound(format!("Product {} not found in your store.", product_id)));
  }

  let content_type = content_type(&req)?;
  let url = storage::upload_product_image(
    &app_state.hosted,
    &app_state.config,
    seller.id,
    product_id,
    &content_type,
    body.to_vec(),
  )
  .await?;
  let product = catalog::set_product_image(&app_state.hosted, &seller, product_id, &url).await?;
  info!(%product_id, %url, "Product image stored.");
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::seller_orders", skip_all, fields(user_id = %auth_user.id()))]
pub async fn list_orders_handler(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let seller = current_seller(&app_state, &auth_user).await?;
  let items = orders::items_for_seller(&app_state.hosted, &seller).await?;
  Ok(HttpResponse::Ok().json(json!({ "items": items })))
}

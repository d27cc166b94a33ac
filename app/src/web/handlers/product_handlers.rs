// app/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::catalog::{self, ProductFilter};
use crate::state::AppState;

#[instrument(name = "handler::list_products", skip(app_state, query_params))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query_params: web::Query<ProductFilter>,
) -> Result<HttpResponse, AppError> {
  let filter = query_params.into_inner();
  let products = catalog::list_products(&app_state.hosted, &filter).await?;
  info!("Fetched {} products.", products.len());

  Ok(HttpResponse::Ok().json(json!({
      "products": products,
      "page": filter.page(),
      "perPage": filter.per_page(),
  })))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  let product = catalog::get_product(&app_state.hosted, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::list_categories", skip(app_state))]
pub async fn list_categories_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let categories = catalog::list_categories(&app_state.hosted).await?;
  Ok(HttpResponse::Ok().json(json!({ "categories": categories })))
}

// app/src/web/handlers/admin_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{OrderStatus, Role};
use crate::services::{catalog, orders, users};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct UserListQuery {
  pub role: Option<Role>,
  pub page: Option<usize>,
  pub per_page: Option<usize>,
}

#[derive(Deserialize, Debug)]
pub struct RolePayload {
  pub role: Role,
}

#[derive(Deserialize, Debug)]
pub struct SellerListQuery {
  pub approved: Option<bool>,
}

#[derive(Deserialize, Debug)]
pub struct ApprovalPayload {
  pub approved: bool,
}

#[derive(Deserialize, Debug)]
pub struct OrderListQuery {
  pub status: Option<OrderStatus>,
}

#[derive(Deserialize, Debug)]
pub struct StatusPayload {
  pub status: OrderStatus,
}

#[derive(Deserialize, Debug)]
pub struct CategoryPayload {
  pub name: String,
}

async fn require_admin(app_state: &AppState, auth_user: &AuthenticatedUser) -> Result<(), AppError> {
  users::require_role(&app_state.hosted, auth_user.id(), Role::Admin).await?;
  Ok(())
}

#[instrument(name = "handler::admin_users", skip(app_state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn list_users_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  query: web::Query<UserListQuery>,
) -> Result<HttpResponse, AppError> {
  require_admin(&app_state, &auth_user).await?;
  let page = query.page.unwrap_or(1).clamp(1, catalog::MAX_PAGE);
  let per_page = query.per_page.unwrap_or(25).clamp(1, 100);
  let rows = users::list_users(&app_state.hosted, query.role, page, per_page).await?;
  Ok(HttpResponse::Ok().json(json!({ "users": rows, "page": page, "perPage": per_page })))
}

#[instrument(name = "handler::admin_set_role", skip(app_state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn set_role_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<RolePayload>,
) -> Result<HttpResponse, AppError> {
  require_admin(&app_state, &auth_user).await?;
  let target = path.into_inner();
  if target == auth_user.id() {
    warn!("Admin tried to change their own role.");
    return Err(AppError::Conflict("You cannot change your own role.".to_string()));
  }
  let row = users::set_role(&app_state.hosted, target, req_payload.role).await?;
  info!(target_user = %target, role = %row.role, "Role changed.");
  Ok(HttpResponse::Ok().json(row))
}

#[instrument(name = "handler::admin_sellers", skip(app_state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn list_sellers_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  query: web::Query<SellerListQuery>,
) -> Result<HttpResponse, AppError> {
  require_admin(&app_state, &auth_user).await?;
  let sellers = users::list_sellers(&app_state.hosted, query.approved).await?;
  Ok(HttpResponse::Ok().json(json!({ "sellers": sellers })))
}

#[instrument(name = "handler::admin_approve_seller", skip(app_state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn set_seller_approval_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<ApprovalPayload>,
) -> Result<HttpResponse, AppError> {
  require_admin(&app_state, &auth_user).await?;
  let seller = users::set_seller_approval(&app_state.hosted, path.into_inner(), req_payload.approved).await?;
  Ok(HttpResponse::Ok().json(seller))
}

#[instrument(name = "handler::admin_orders", skip(app_state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  query: web::Query<OrderListQuery>,
) -> Result<HttpResponse, AppError> {
  require_admin(&app_state, &auth_user).await?;
  let all = orders::all_orders(&app_state.hosted, query.status).await?;
  Ok(HttpResponse::Ok().json(json!({ "orders": all })))
}

#[instrument(name = "handler::admin_order_status", skip(app_state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn set_order_status_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<StatusPayload>,
) -> Result<HttpResponse, AppError> {
  require_admin(&app_state, &auth_user).await?;
  let order = orders::set_status(&app_state.hosted, path.into_inner(), req_payload.status).await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::admin_create_category", skip(app_state, auth_user), fields(user_id = %auth_user.id()))]
pub async fn create_category_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<CategoryPayload>,
) -> Result<HttpResponse, AppError> {
  require_admin(&app_state, &auth_user).await?;
  let category = catalog::create_category(&app_state.hosted, &req_payload.name).await?;
  Ok(HttpResponse::Created().json(category))
}

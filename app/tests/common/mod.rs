// app/tests/common/mod.rs
#![allow(dead_code)]

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::LOCATION;
use marketplace::config::AppConfig;
use marketplace::hosted::{AuthSession, Hosted, MemoryBackend};
use marketplace::models::{tables, Product, Role, Seller, UserRow};
use marketplace::services::{auth_service, users};
use marketplace::state::AppState;
use marketplace::web::session;
use once_cell::sync::Lazy;
use serde_json::json;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,marketplace=debug"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub const PASSWORD: &str = "correct-horse-battery";

/// App state over a fresh in-memory backend, plus the backend for test hooks.
pub fn memory_state() -> (AppState, Arc<MemoryBackend>) {
  setup_tracing();
  let config = AppConfig::for_memory_backend();
  let backend = Arc::new(MemoryBackend::new(&config.app_base_url));
  let state = AppState::new(Hosted::from_memory(backend.clone()), config);
  (state, backend)
}

/// A signed-in account with a `users` row for `role` and its companion row.
pub async fn seed_user(state: &AppState, email: &str, role: Role) -> (AuthSession, UserRow) {
  let outcome = state
    .hosted
    .auth
    .sign_up(email, PASSWORD, json!({ "full_name": "Test User" }))
    .await
    .expect("sign up");
  let row = users::insert_user_row(&state.hosted, outcome.user.id, email, Some("Test User"), role)
    .await
    .expect("users row");
  auth_service::create_companion_row(&state.hosted, outcome.user.id, role, Some("Test Store"))
    .await
    .expect("companion row");
  (outcome.session.expect("memory backend auto-confirms"), row)
}

/// An account known to the auth provider only, with no `users` row.
pub async fn seed_bare_account(state: &AppState, email: &str) -> AuthSession {
  state
    .hosted
    .auth
    .sign_up(email, PASSWORD, json!({}))
    .await
    .expect("sign up")
    .session
    .expect("session")
}

pub async fn seller_of(state: &AppState, user_id: Uuid) -> Seller {
  users::require_seller(&state.hosted, user_id).await.expect("seller row")
}

pub async fn seed_product(state: &AppState, seller: &Seller, name: &str, price_cents: i64, stock: i32) -> Product {
  state
    .hosted
    .insert_as(
      tables::PRODUCTS,
      &json!({
        "seller_id": seller.id.to_string(),
        "name": name,
        "price_cents": price_cents,
        "stock_quantity": stock,
      }),
    )
    .await
    .expect("product row")
}

pub fn cookies_for(state: &AppState, auth_session: &AuthSession) -> [Cookie<'static>; 2] {
  session::session_cookies(&state.config, auth_session)
}

pub fn location<B>(resp: &ServiceResponse<B>) -> Option<String> {
  resp
    .headers()
    .get(LOCATION)
    .and_then(|v| v.to_str().ok())
    .map(str::to_string)
}

pub fn response_cookie<B: MessageBody>(resp: &ServiceResponse<B>, name: &str) -> Option<Cookie<'static>> {
  resp
    .response()
    .cookies()
    .find(|c| c.name() == name)
    .map(|c| c.into_owned())
}

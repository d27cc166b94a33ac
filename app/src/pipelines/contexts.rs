// app/src/pipelines/contexts.rs

//! Context data carried through each flow. Handlers receive these wrapped in
//! `stepflow::ContextData`.

use crate::hosted::{AuthSession, AuthUser};
use crate::models::{CartLine, Order, OrderItem, Role, UserRow};
use crate::services::payment_sim::PaymentReceipt;
use crate::state::AppState;
use uuid::Uuid;

#[derive(Clone)]
pub struct SignupCtxData {
  pub app_state: AppState,
  pub email: String,
  pub password: String,
  pub full_name: String,
  pub role: Role,
  pub store_name: Option<String>,

  pub created_user: Option<AuthUser>,
  // Absent when the platform requires email confirmation first.
  pub session: Option<AuthSession>,
  pub user_row: Option<UserRow>,
}

impl SignupCtxData {
  pub fn new(app_state: AppState, email: String, password: String, full_name: String, role: Role, store_name: Option<String>) -> Self {
    Self {
      app_state,
      email,
      password,
      full_name,
      role,
      store_name,
      created_user: None,
      session: None,
      user_row: None,
    }
  }
}

#[derive(Clone)]
pub struct SigninCtxData {
  pub app_state: AppState,
  pub email: String,
  pub password: String,

  pub session: Option<AuthSession>,
  pub user_row: Option<UserRow>,
}

impl SigninCtxData {
  pub fn new(app_state: AppState, email: String, password: String) -> Self {
    Self {
      app_state,
      email,
      password,
      session: None,
      user_row: None,
    }
  }
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub shipping_address: String,
  pub payment_method: String,

  pub lines: Vec<CartLine>,
  pub total_cents: i64,
  // Stock levels read during validation, used to write the decrement.
  pub stock_levels: Vec<(Uuid, i32)>,
  pub order: Option<Order>,
  pub items: Vec<OrderItem>,
  pub payment: Option<PaymentReceipt>,
}

impl CheckoutCtxData {
  pub fn new(app_state: AppState, user_id: Uuid, shipping_address: String, payment_method: String) -> Self {
    Self {
      app_state,
      user_id,
      shipping_address,
      payment_method,
      lines: Vec::new(),
      total_cents: 0,
      stock_levels: Vec::new(),
      order: None,
      items: Vec::new(),
      payment: None,
    }
  }
}

// app/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Paid,
  Failed,
  Shipped,
  Delivered,
  Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub status: OrderStatus,
  pub total_cents: i64,
  pub currency: String,
  #[serde(default)]
  pub shipping_address: Option<String>,
  // Reference of the simulated payment.
  #[serde(default)]
  pub payment_reference: Option<String>,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

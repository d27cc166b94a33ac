// app/src/models/order_item.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub seller_id: Uuid,
  pub quantity: i32,
  pub price_cents: i64,
}

// app/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
  pub id: Uuid,
  pub seller_id: Uuid,
  #[serde(default)]
  pub category_id: Option<Uuid>,
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  pub price_cents: i64,
  pub stock_quantity: i32,
  #[serde(default)]
  pub rating: Option<f64>,
  #[serde(default)]
  pub image_url: Option<String>,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

impl Product {
  pub fn in_stock(&self, quantity: u32) -> bool {
    i64::from(self.stock_quantity) >= i64::from(quantity)
  }
}

// app/src/models/cart_item.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of a cart. Name, price and image are captured when the product is
/// added so the cart can be rendered without another lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
  pub product_id: Uuid,
  pub seller_id: Uuid,
  pub name: String,
  pub price_cents: i64,
  pub quantity: u32,
  #[serde(default)]
  pub image_url: Option<String>,
}

impl CartLine {
  /// `None` when the product does not fit in an `i64`.
  pub fn line_total_cents(&self) -> Option<i64> {
    self.price_cents.checked_mul(i64::from(self.quantity))
  }
}

/// Sum of line totals, `None` on overflow.
pub fn checked_total_cents(lines: &[CartLine]) -> Option<i64> {
  lines
    .iter()
    .try_fold(0i64, |total, line| total.checked_add(line.line_total_cents()?))
}

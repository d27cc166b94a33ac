// app/src/models/wishlist.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistItem {
  pub id: Uuid,
  pub user_id: Uuid,
  pub product_id: Uuid,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

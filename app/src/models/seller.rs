// app/src/models/seller.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seller {
  pub id: Uuid,
  pub user_id: Uuid,
  pub store_name: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub approved: bool,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

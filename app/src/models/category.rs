// app/src/models/category.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
  pub id: Uuid,
  pub name: String,
  pub slug: String,
}

// app/src/models/profile.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Contact details kept alongside a user. `id` is the user's id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
  pub id: Uuid,
  #[serde(default)]
  pub phone: Option<String>,
  #[serde(default)]
  pub address_line: Option<String>,
  #[serde(default)]
  pub city: Option<String>,
  #[serde(default)]
  pub country: Option<String>,
}

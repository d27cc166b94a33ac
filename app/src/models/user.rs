// app/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Customer,
  Seller,
  Admin,
}

impl Role {
  pub const ALL: [Role; 3] = [Role::Customer, Role::Seller, Role::Admin];

  pub fn as_str(self) -> &'static str {
    match self {
      Role::Customer => "customer",
      Role::Seller => "seller",
      Role::Admin => "admin",
    }
  }

  /// Root path of this role's dashboard.
  pub fn root_path(self) -> &'static str {
    match self {
      Role::Customer => "/customer",
      Role::Seller => "/seller",
      Role::Admin => "/admin",
    }
  }

  /// Roles a visitor may pick for themselves when registering.
  pub fn is_self_assignable(self) -> bool {
    !matches!(self, Role::Admin)
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "customer" => Ok(Role::Customer),
      "seller" => Ok(Role::Seller),
      "admin" => Ok(Role::Admin),
      other => Err(format!("unknown role '{}'", other)),
    }
  }
}

/// A row of the `users` table: the app-side record holding the role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRow {
  pub id: Uuid,
  pub email: String,
  #[serde(default)]
  pub full_name: Option<String>,
  pub role: Role,
  #[serde(default)]
  pub avatar_url: Option<String>,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
}

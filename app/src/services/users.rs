// app/src/services/users.rs

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::hosted::{Filter, Hosted, Query};
use crate::models::{tables, Profile, Role, Seller, UserRow};
use crate::services::catalog;

/// Looks up the role stored for a user. The session middleware depends on
/// this seam rather than on the hosted tables directly.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
  async fn role_of(&self, user_id: Uuid) -> Result<Option<Role>>;
}

#[async_trait]
impl RoleDirectory for Hosted {
  async fn role_of(&self, user_id: Uuid) -> Result<Option<Role>> {
    Ok(fetch_user_row(self, user_id).await?.map(|row| row.role))
  }
}

#[instrument(name = "users::fetch_user_row", skip(hosted), err(Display))]
pub async fn fetch_user_row(hosted: &Hosted, user_id: Uuid) -> Result<Option<UserRow>> {
  Ok(hosted.select_one(tables::USERS, Query::new().eq("id", user_id.to_string())).await?)
}

pub async fn require_user_row(hosted: &Hosted, user_id: Uuid) -> Result<UserRow> {
  fetch_user_row(hosted, user_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("No user record for {}", user_id)))
}

/// The caller's row, if its role is `role`; `Forbidden` otherwise.
pub async fn require_role(hosted: &Hosted, user_id: Uuid, role: Role) -> Result<UserRow> {
  match fetch_user_row(hosted, user_id).await? {
    Some(row) if row.role == role => Ok(row),
    Some(row) => {
      debug!(%user_id, have = %row.role, need = %role, "Role check failed.");
      Err(AppError::Forbidden(format!("This action requires the {} role.", role)))
    }
    None => Err(AppError::Forbidden("Complete your profile first.".to_string())),
  }
}

pub async fn insert_user_row(hosted: &Hosted, user_id: Uuid, email: &str, full_name: Option<&str>, role: Role) -> Result<UserRow> {
  let row = json!({
    "id": user_id.to_string(),
    "email": email,
    "full_name": full_name,
    "role": role,
  });
  Ok(hosted.insert_as(tables::USERS, &row).await?)
}

pub async fn delete_user_row(hosted: &Hosted, user_id: Uuid) -> Result<usize> {
  Ok(hosted.tables.delete(tables::USERS, &[Filter::eq("id", user_id.to_string())]).await?)
}

pub async fn update_user_row(hosted: &Hosted, user_id: Uuid, patch: Value) -> Result<UserRow> {
  hosted
    .update_as::<UserRow>(tables::USERS, &[Filter::eq("id", user_id.to_string())], patch)
    .await?
    .into_iter()
    .next()
    .ok_or_else(|| AppError::NotFound(format!("No user record for {}", user_id)))
}

pub async fn fetch_profile(hosted: &Hosted, user_id: Uuid) -> Result<Option<Profile>> {
  Ok(hosted.select_one(tables::PROFILES, Query::new().eq("id", user_id.to_string())).await?)
}

/// Inserts the profile row or patches the existing one.
#[instrument(name = "users::upsert_profile", skip(hosted, profile), fields(user_id = %profile.id), err(Display))]
pub async fn upsert_profile(hosted: &Hosted, profile: &Profile) -> Result<Profile> {
  if fetch_profile(hosted, profile.id).await?.is_some() {
    let patch = serde_json::to_value(profile).map_err(|e| AppError::Internal(e.to_string()))?;
    hosted
      .update_as::<Profile>(tables::PROFILES, &[Filter::eq("id", profile.id.to_string())], patch)
      .await?
      .into_iter()
      .next()
      .ok_or_else(|| AppError::NotFound("Profile disappeared during update.".to_string()))
  } else {
    Ok(hosted.insert_as(tables::PROFILES, profile).await?)
  }
}

pub async fn fetch_seller_for_user(hosted: &Hosted, user_id: Uuid) -> Result<Option<Seller>> {
  Ok(hosted.select_one(tables::SELLERS, Query::new().eq("user_id", user_id.to_string())).await?)
}

pub async fn require_seller(hosted: &Hosted, user_id: Uuid) -> Result<Seller> {
  fetch_seller_for_user(hosted, user_id)
    .await?
    .ok_or_else(|| AppError::Forbidden("No seller account is attached to this user.".to_string()))
}

pub async fn insert_seller(hosted: &Hosted, user_id: Uuid, store_name: &str) -> Result<Seller> {
  let row = json!({
    "user_id": user_id.to_string(),
    "store_name": store_name,
    "approved": false,
  });
  Ok(hosted.insert_as(tables::SELLERS, &row).await?)
}

// --- Admin screens ---

pub async fn list_users(hosted: &Hosted, role: Option<Role>, page: usize, per_page: usize) -> Result<Vec<UserRow>> {
  let mut query = Query::new().order_by("created_at", false);
  if let Some(role) = role {
    query = query.eq("role", role.as_str());
  }
  let query = query.offset(catalog::page_offset(page, per_page)).limit(per_page);
  Ok(hosted.select_as(tables::USERS, &query).await?)
}

/// Changes a user's role and creates the companion row the new role needs
/// when it is missing. A new seller row starts unapproved and is named after
/// the user; rows of the previous role are kept.
#[instrument(name = "users::set_role", skip(hosted), err(Display))]
pub async fn set_role(hosted: &Hosted, user_id: Uuid, role: Role) -> Result<UserRow> {
  let row = update_user_row(hosted, user_id, json!({ "role": role })).await?;
  match role {
    Role::Seller if fetch_seller_for_user(hosted, user_id).await?.is_none() => {
      let owner = row.full_name.as_deref().filter(|n| !n.trim().is_empty()).unwrap_or(row.email.as_str());
      let seller = insert_seller(hosted, user_id, &format!("{}'s store", owner.trim())).await?;
      debug!(%user_id, seller_id = %seller.id, "Seller row created for promoted user.");
    }
    Role::Customer if fetch_profile(hosted, user_id).await?.is_none() => {
      hosted
        .insert_as::<Profile, _>(tables::PROFILES, &Profile { id: user_id, ..Default::default() })
        .await?;
    }
    _ => {}
  }
  Ok(row)
}

pub async fn list_sellers(hosted: &Hosted, approved: Option<bool>) -> Result<Vec<Seller>> {
  let mut query = Query::new().order_by("created_at", false);
  if let Some(approved) = approved {
    query = query.eq("approved", approved);
  }
  Ok(hosted.select_as(tables::SELLERS, &query).await?)
}

pub async fn set_seller_approval(hosted: &Hosted, seller_id: Uuid, approved: bool) -> Result<Seller> {
  hosted
    .update_as::<Seller>(
      tables::SELLERS,
      &[Filter::eq("id", seller_id.to_string())],
      json!({ "approved": approved }),
    )
    .await?
    .into_iter()
    .next()
    .ok_or_else(|| AppError::NotFound(format!("Seller {} not found.", seller_id)))
}

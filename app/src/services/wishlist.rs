// app/src/services/wishlist.rs

use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::hosted::{Filter, Hosted, Query};
use crate::models::{tables, WishlistItem};

pub async fn list(hosted: &Hosted, user_id: Uuid) -> Result<Vec<WishlistItem>> {
  let query = Query::new().eq("user_id", user_id.to_string()).order_by("created_at", false);
  Ok(hosted.select_as(tables::WISHLIST, &query).await?)
}

/// Adding a product that is already listed returns the existing row.
#[instrument(name = "wishlist::add", skip(hosted), err(Display))]
pub async fn add(hosted: &Hosted, user_id: Uuid, product_id: Uuid) -> Result<WishlistItem> {
  let existing = Query::new()
    .eq("user_id", user_id.to_string())
    .eq("product_id", product_id.to_string());
  if let Some(item) = hosted.select_one(tables::WISHLIST, existing).await? {
    return Ok(item);
  }
  let row = json!({ "user_id": user_id.to_string(), "product_id": product_id.to_string() });
  Ok(hosted.insert_as(tables::WISHLIST, &row).await?)
}

#[instrument(name = "wishlist::remove", skip(hosted), err(Display))]
pub async fn remove(hosted: &Hosted, user_id: Uuid, product_id: Uuid) -> Result<()> {
  let filters = [
    Filter::eq("user_id", user_id.to_string()),
    Filter::eq("product_id", product_id.to_string()),
  ];
  match hosted.tables.delete(tables::WISHLIST, &filters).await? {
    0 => Err(AppError::NotFound("Product is not on your wishlist.".to_string())),
    _ => Ok(()),
  }
}

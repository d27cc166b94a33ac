// app/src/services/storage.rs

use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::hosted::Hosted;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// File extension for an accepted image content type.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
  match content_type.split(';').next().map(str::trim) {
    Some("image/png") => Some("png"),
    Some("image/jpeg") | Some("image/jpg") => Some("jpg"),
    Some("image/webp") => Some("webp"),
    Some("image/gif") => Some("gif"),
    _ => None,
  }
}

fn check_image(content_type: &str, bytes: &[u8]) -> Result<&'static str> {
  let ext = image_extension(content_type)
    .ok_or_else(|| AppError::Validation(format!("Unsupported image type '{}'.", content_type)))?;
  if bytes.is_empty() {
    return Err(AppError::Validation("Uploaded file is empty.".to_string()));
  }
  if bytes.len() > MAX_IMAGE_BYTES {
    return Err(AppError::Validation("Images must be 5 MB or smaller.".to_string()));
  }
  Ok(ext)
}

/// Uploads an avatar and returns its public URL.
#[instrument(name = "storage::upload_avatar", skip(hosted, config, bytes), fields(size = bytes.len()), err(Display))]
pub async fn upload_avatar(hosted: &Hosted, config: &AppConfig, user_id: Uuid, content_type: &str, bytes: Vec<u8>) -> Result<String> {
  let ext = check_image(content_type, &bytes)?;
  let path = format!("avatars/{}.{}", user_id, ext);
  let url = hosted.storage.upload(&config.storage_bucket, &path, content_type, bytes).await?;
  info!(%url, "Avatar uploaded.");
  Ok(url)
}

#[instrument(name = "storage::upload_product_image", skip(hosted, config, bytes), fields(size = bytes.len()), err(Display))]
pub async fn upload_product_image(
  hosted: &Hosted,
  config: &AppConfig,
  seller_id: Uuid,
  product_id: Uuid,
  content_type: &str,
  bytes: Vec<u8>,
) -> Result<String> {
  let ext = check_image(content_type, &bytes)?;
  // New name per upload; the old object is left in place.
  let path = format!("products/{}/{}-{}.{}", seller_id, product_id, Uuid::new_v4().simple(), ext);
  Ok(hosted.storage.upload(&config.storage_bucket, &path, content_type, bytes).await?)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_images_are_accepted() {
    assert_eq!(image_extension("image/png"), Some("png"));
    assert_eq!(image_extension("image/jpeg; charset=binary"), Some("jpg"));
    assert_eq!(image_extension("application/pdf"), None);
  }

  #[test]
  fn oversize_and_empty_files_are_rejected() {
    assert!(check_image("image/png", &[]).is_err());
    assert!(check_image("image/png", &vec![0u8; MAX_IMAGE_BYTES + 1]).is_err());
    assert!(check_image("image/png", &[1, 2, 3]).is_ok());
  }
}

// app/src/services/catalog.rs

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::hosted::{Filter, Hosted, Query};
use crate::models::{tables, Category, Product, Seller};

pub const DEFAULT_PAGE_SIZE: usize = 12;
pub const MAX_PAGE_SIZE: usize = 100;
/// Deepest page a listing will serve.
pub const MAX_PAGE: usize = 10_000;
/// Highest accepted product price. Keeps cart and order totals within `i64`.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Row offset of a 1-based page.
pub fn page_offset(page: usize, per_page: usize) -> usize {
  page.clamp(1, MAX_PAGE).saturating_sub(1).saturating_mul(per_page)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
  #[default]
  Newest,
  PriceAsc,
  PriceDesc,
  Rating,
}

/// Browse filters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
  pub category: Option<Uuid>,
  pub q: Option<String>,
  pub min_price: Option<i64>,
  pub max_price: Option<i64>,
  #[serde(default)]
  pub sort: ProductSort,
  pub page: Option<usize>,
  pub per_page: Option<usize>,
}

impl ProductFilter {
  pub fn page(&self) -> usize {
    self.page.unwrap_or(1).clamp(1, MAX_PAGE)
  }

  pub fn per_page(&self) -> usize {
    self.per_page.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
  }

  /// The hosted query for this filter. The name search is passed straight
  /// to the store's case-insensitive pattern filter.
  pub fn to_query(&self) -> Query {
    let mut query = Query::new();
    if let Some(category) = self.category {
      query = query.eq("category_id", category.to_string());
    }
    if let Some(term) = self.q.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
      query = query.ilike_contains("name", term);
    }
    if let Some(min) = self.min_price {
      query = query.gte("price_cents", min);
    }
    if let Some(max) = self.max_price {
      query = query.lte("price_cents", max);
    }
    query = match self.sort {
      ProductSort::Newest => query.order_by("created_at", false),
      ProductSort::PriceAsc => query.order_by("price_cents", true),
      ProductSort::PriceDesc => query.order_by("price_cents", false),
      ProductSort::Rating => query.order_by("rating", false),
    };
    query.offset(page_offset(self.page(), self.per_page())).limit(self.per_page())
  }
}

#[instrument(name = "catalog::list_products", skip(hosted), err(Display))]
pub async fn list_products(hosted: &Hosted, filter: &ProductFilter) -> Result<Vec<Product>> {
  Ok(hosted.select_as(tables::PRODUCTS, &filter.to_query()).await?)
}

pub async fn get_product(hosted: &Hosted, product_id: Uuid) -> Result<Product> {
  hosted
    .select_one(tables::PRODUCTS, Query::new().eq("id", product_id.to_string()))
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found.", product_id)))
}

pub async fn products_by_ids(hosted: &Hosted, ids: &[Uuid]) -> Result<Vec<Product>> {
  if ids.is_empty() {
    return Ok(Vec::new());
  }
  let ids = ids.iter().map(|id| Value::from(id.to_string())).collect();
  Ok(hosted.select_as(tables::PRODUCTS, &Query::new().is_in("id", ids)).await?)
}

pub async fn list_categories(hosted: &Hosted) -> Result<Vec<Category>> {
  Ok(hosted.select_as(tables::CATEGORIES, &Query::new().order_by("name", true)).await?)
}

pub async fn create_category(hosted: &Hosted, name: &str) -> Result<Category> {
  let name = name.trim();
  if name.is_empty() {
    return Err(AppError::Validation("Category name is required.".to_string()));
  }
  let row = json!({ "name": name, "slug": slugify(name) });
  Ok(hosted.insert_as(tables::CATEGORIES, &row).await?)
}

fn slugify(name: &str) -> String {
  name
    .to_lowercase()
    .split(|c: char| !c.is_ascii_alphanumeric())
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join("-")
}

// --- Seller-owned products ---

#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
  pub name: String,
  pub description: Option<String>,
  pub price_cents: i64,
  pub stock_quantity: i32,
  pub category_id: Option<Uuid>,
}

fn check_price(price_cents: i64) -> Result<()> {
  if price_cents <= 0 {
    return Err(AppError::Validation("Price must be greater than zero.".to_string()));
  }
  if price_cents > MAX_PRICE_CENTS {
    return Err(AppError::Validation(format!("Price cannot exceed {} cents.", MAX_PRICE_CENTS)));
  }
  Ok(())
}

impl ProductInput {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(AppError::Validation("Product name is required.".to_string()));
    }
    check_price(self.price_cents)?;
    if self.stock_quantity < 0 {
      return Err(AppError::Validation("Stock cannot be negative.".to_string()));
    }
    Ok(())
  }
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
  pub name: Option<String>,
  pub description: Option<String>,
  pub price_cents: Option<i64>,
  pub stock_quantity: Option<i32>,
  pub category_id: Option<Uuid>,
}

impl ProductPatch {
  fn into_json(self) -> Result<Value> {
    let mut patch = Map::new();
    if let Some(name) = self.name {
      if name.trim().is_empty() {
        return Err(AppError::Validation("Product name cannot be blank.".to_string()));
      }
      patch.insert("name".into(), json!(name.trim()));
    }
    if let Some(description) = self.description {
      patch.insert("description".into(), json!(description));
    }
    if let Some(price) = self.price_cents {
      check_price(price)?;
      patch.insert("price_cents".into(), json!(price));
    }
    if let Some(stock) = self.stock_quantity {
      if stock < 0 {
        return Err(AppError::Validation("Stock cannot be negative.".to_string()));
      }
      patch.insert("stock_quantity".into(), json!(stock));
    }
    if let Some(category) = self.category_id {
      patch.insert("category_id".into(), json!(category.to_string()));
    }
    if patch.is_empty() {
      return Err(AppError::Validation("Nothing to update.".to_string()));
    }
    Ok(Value::Object(patch))
  }
}

fn owned_by(seller: &Seller, product_id: Uuid) -> [Filter; 2] {
  [Filter::eq("id", product_id.to_string()), Filter::eq("seller_id", seller.id.to_string())]
}

pub async fn seller_products(hosted: &Hosted, seller: &Seller) -> Result<Vec<Product>> {
  let query = Query::new().eq("seller_id", seller.id.to_string()).order_by("created_at", false);
  Ok(hosted.select_as(tables::PRODUCTS, &query).await?)
}

#[instrument(name = "catalog::create_product", skip(hosted, seller, input), fields(seller_id = %seller.id), err(Display))]
pub async fn create_product(hosted: &Hosted, seller: &Seller, input: ProductInput) -> Result<Product> {
  input.validate()?;
  let row = json!({
    "seller_id": seller.id.to_string(),
    "category_id": input.category_id.map(|c| c.to_string()),
    "name": input.name.trim(),
    "description": input.description,
    "price_cents": input.price_cents,
    "stock_quantity": input.stock_quantity,
  });
  let product: Product = hosted.insert_as(tables::PRODUCTS, &row).await?;
  info!(product_id = %product.id, "Product created.");
  Ok(product)
}

/// Updates a product only if it belongs to `seller`.
#[instrument(name = "catalog::update_product", skip(hosted, seller, patch), fields(seller_id = %seller.id), err(Display))]
pub async fn update_product(hosted: &Hosted, seller: &Seller, product_id: Uuid, patch: ProductPatch) -> Result<Product> {
  hosted
    .update_as::<Product>(tables::PRODUCTS, &owned_by(seller, product_id), patch.into_json()?)
    .await?
    .into_iter()
    .next()
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found in your store.", product_id)))
}

#[instrument(name = "catalog::delete_product", skip(hosted, seller), fields(seller_id = %seller.id), err(Display))]
pub async fn delete_product(hosted: &Hosted, seller: &Seller, product_id: Uuid) -> Result<()> {
  match hosted.tables.delete(tables::PRODUCTS, &owned_by(seller, product_id)).await? {
    0 => Err(AppError::NotFound(format!("Product {} not found in your store.", product_id))),
    _ => Ok(()),
  }
}

pub async fn set_product_image(hosted: &Hosted, seller: &Seller, product_id: Uuid, image_url: &str) -> Result<Product> {
  hosted
    .update_as::<Product>(tables::PRODUCTS, &owned_by(seller, product_id), json!({ "image_url": image_url }))
    .await?
    .into_iter()
    .next()
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found in your store.", product_id)))
}

/// Writes a new stock level. Not atomic with respect to concurrent buyers.
pub async fn set_stock(hosted: &Hosted, product_id: Uuid, stock_quantity: i32) -> Result<()> {
  hosted
    .tables
    .update(
      tables::PRODUCTS,
      &[Filter::eq("id", product_id.to_string())],
      json!({ "stock_quantity": stock_quantity }),
    )
    .await?;
  Ok(())
}

// app/src/services/cart.rs

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::hosted::{Hosted, Query};
use crate::models::{checked_total_cents, tables, CartLine, Product};

/// Largest quantity one cart line may hold; stock levels are `i32`.
pub const MAX_LINE_QUANTITY: u32 = i32::MAX as u32;

fn quantity_too_large() -> AppError {
  AppError::Validation(format!("Quantity cannot exceed {}.", MAX_LINE_QUANTITY))
}

/// A shopping cart keyed by product id. Totals are always derived from the
/// lines, never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
  lines: Vec<CartLine>,
}

impl Cart {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn lines(&self) -> &[CartLine] {
    &self.lines
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  /// Adds a line, merging quantities with an existing line for the same
  /// product. The stored name and price follow the most recent add. The
  /// cart is left untouched when the merged quantity would exceed
  /// [`MAX_LINE_QUANTITY`].
  pub fn add(&mut self, line: CartLine) -> Result<()> {
    if line.quantity == 0 {
      return Ok(());
    }
    if line.quantity > MAX_LINE_QUANTITY {
      return Err(quantity_too_large());
    }
    match self.lines.iter_mut().find(|l| l.product_id == line.product_id) {
      Some(existing) => {
        existing.quantity = existing
          .quantity
          .checked_add(line.quantity)
          .filter(|q| *q <= MAX_LINE_QUANTITY)
          .ok_or_else(quantity_too_large)?;
        existing.name = line.name;
        existing.price_cents = line.price_cents;
        existing.image_url = line.image_url;
      }
      None => self.lines.push(line),
    }
    Ok(())
  }

  /// Returns whether a line was removed.
  pub fn remove(&mut self, product_id: Uuid) -> bool {
    let before = self.lines.len();
    self.lines.retain(|l| l.product_id != product_id);
    self.lines.len() != before
  }

  /// Sets the quantity of an existing line; zero removes it. Returns whether
  /// the product was in the cart.
  pub fn update_quantity(&mut self, product_id: Uuid, quantity: u32) -> bool {
    if quantity == 0 {
      return self.remove(product_id);
    }
    match self.lines.iter_mut().find(|l| l.product_id == product_id) {
      Some(line) => {
        line.quantity = quantity;
        true
      }
      None => false,
    }
  }

  pub fn clear(&mut self) {
    self.lines.clear();
  }

  pub fn quantity_of(&self, product_id: Uuid) -> u32 {
    self
      .lines
      .iter()
      .find(|l| l.product_id == product_id)
      .map_or(0, |l| l.quantity)
  }

  /// Saturates at `i64::MAX`; checkout uses the checked sum instead.
  pub fn total_cents(&self) -> i64 {
    checked_total_cents(&self.lines).unwrap_or(i64::MAX)
  }

  pub fn item_count(&self) -> u32 {
    self.lines.iter().fold(0u32, |count, l| count.saturating_add(l.quantity))
  }
}

/// What the cart endpoints return.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
  pub lines: Vec<CartLine>,
  pub total_cents: i64,
  pub item_count: u32,
  pub currency: String,
}

impl CartView {
  pub fn of(cart: &Cart, currency: &str) -> Self {
    Self {
      lines: cart.lines().to_vec(),
      total_cents: cart.total_cents(),
      item_count: cart.item_count(),
      currency: currency.to_string(),
    }
  }
}

/// One cart per signed-in user, held for the life of the process.
#[derive(Debug, Default)]
pub struct CartStore {
  carts: RwLock<HashMap<Uuid, Cart>>,
}

impl CartStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, user_id: Uuid) -> Cart {
    self.carts.read().get(&user_id).cloned().unwrap_or_default()
  }

  /// Runs `f` against the user's cart under the write lock.
  pub fn with_cart<R>(&self, user_id: Uuid, f: impl FnOnce(&mut Cart) -> R) -> R {
    let mut carts = self.carts.write();
    f(carts.entry(user_id).or_default())
  }

  pub fn clear(&self, user_id: Uuid) {
    self.carts.write().remove(&user_id);
  }
}

async fn fetch_product(hosted: &Hosted, product_id: Uuid) -> Result<Product> {
  hosted
    .select_one(tables::PRODUCTS, Query::new().eq("id", product_id.to_string()))
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found.", product_id)))
}

/// Adds `quantity` of a product after checking it exists and that the
/// resulting cart quantity is in stock.
#[instrument(name = "cart::add_product", skip(hosted, store), err(Display))]
pub async fn add_product(hosted: &Hosted, store: &CartStore, user_id: Uuid, product_id: Uuid, quantity: u32) -> Result<Cart> {
  if quantity == 0 {
    return Err(AppError::Validation("Quantity must be at least 1.".to_string()));
  }
  if quantity > MAX_LINE_QUANTITY {
    return Err(quantity_too_large());
  }
  let product = fetch_product(hosted, product_id).await?;
  let wanted = store
    .get(user_id)
    .quantity_of(product_id)
    .checked_add(quantity)
    .filter(|q| *q <= MAX_LINE_QUANTITY)
    .ok_or_else(quantity_too_large)?;
  if !product.in_stock(wanted) {
    return Err(AppError::Conflict(format!(
      "Only {} of '{}' left in stock.",
      product.stock_quantity.max(0),
      product.name
    )));
  }

  let line = CartLine {
    product_id: product.id,
    seller_id: product.seller_id,
    name: product.name,
    price_cents: product.price_cents,
    quantity,
    image_url: product.image_url,
  };
  let cart = store.with_cart(user_id, |cart| {
    cart.add(line)?;
    Ok::<_, AppError>(cart.clone())
  })?;
  debug!(items = cart.item_count(), "Cart updated.");
  Ok(cart)
}

/// Sets a line's quantity, checking stock for anything above zero.
#[instrument(name = "cart::set_quantity", skip(hosted, store), err(Display))]
pub async fn set_quantity(hosted: &Hosted, store: &CartStore, user_id: Uuid, product_id: Uuid, quantity: u32) -> Result<Cart> {
  if quantity > MAX_LINE_QUANTITY {
    return Err(quantity_too_large());
  }
  if quantity > 0 {
    let product = fetch_product(hosted, product_id).await?;
    if !product.in_stock(quantity) {
      return Err(AppError::Conflict(format!("Only {} of '{}' left in stock.", product.stock_quantity.max(0), product.name)));
    }
  }
  store.with_cart(user_id, |cart| {
    if cart.update_quantity(product_id, quantity) || quantity == 0 {
      Ok(cart.clone())
    } else {
      Err(AppError::NotFound(format!("Product {} is not in the cart.", product_id)))
    }
  })
}

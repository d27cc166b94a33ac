// app/src/pipelines/checkout_pipeline.rs

use crate::errors::{AppError, Result as AppResult};
use crate::models::checked_total_cents;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::services::{catalog, orders, payment_sim};
use std::collections::HashMap;
use stepflow::{ContextData, Pipeline, PipelineControl};
use tracing::{event, info, warn, Level};

/// Builds the checkout flow:
///
/// load cart → validate stock → create order → insert items → capture
/// payment → mark paid → decrement stock → clear cart.
///
/// If any required step after order creation fails, the order and its items
/// are deleted again. Stock is only written after payment succeeded, and a
/// failure there does not undo the paid order.
pub fn build_checkout_pipeline() -> Pipeline<CheckoutCtxData, AppError> {
  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(&[
    ("load_cart", false, None),
    ("validate_stock", false, None),
    ("create_order", false, None),
    ("insert_order_items", false, None),
    ("capture_payment", false, None),
    ("mark_order_paid", false, None),
    ("decrement_stock", true, None),
    ("clear_cart", false, None),
  ]);

  p.on("load_cart", load_cart);
  p.on("validate_stock", validate_stock);
  p.on("create_order", create_order);
  p.compensate("create_order", discard_order);
  p.on("insert_order_items", insert_order_items);
  p.on("capture_payment", capture_payment);
  p.on("mark_order_paid", mark_order_paid);
  p.on("decrement_stock", decrement_stock);
  p.on("clear_cart", |ctx_data: ContextData<CheckoutCtxData>| async move {
    let (carts, user_id) = {
      let guard = ctx_data.read();
      (guard.app_state.carts.clone(), guard.user_id)
    };
    carts.clear(user_id);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  info!("Checkout pipeline built.");
  p
}

async fn load_cart(ctx_data: ContextData<CheckoutCtxData>) -> AppResult<PipelineControl> {
  let (carts, user_id, address_blank) = {
    let guard = ctx_data.read();
    (guard.app_state.carts.clone(), guard.user_id, guard.shipping_address.trim().is_empty())
  };
  if address_blank {
    return Err(AppError::Validation("A shipping address is required.".to_string()));
  }
  let cart = carts.get(user_id);
  if cart.is_empty() {
    return Err(AppError::Validation("Your cart is empty.".to_string()));
  }
  event!(Level::DEBUG, lines = cart.lines().len(), items = cart.item_count(), "Cart loaded for checkout.");
  ctx_data.write().lines = cart.lines().to_vec();
  Ok(PipelineControl::Continue)
}

/// Re-reads every product, rejects the checkout if any line is unavailable,
/// and reprices lines at the current price.
async fn validate_stock(ctx_data: ContextData<CheckoutCtxData>) -> AppResult<PipelineControl> {
  let (hosted, mut lines) = {
    let guard = ctx_data.read();
    (guard.app_state.hosted.clone(), guard.lines.clone())
  };

  let ids: Vec<_> = lines.iter().map(|l| l.product_id).collect();
  let products: HashMap<_, _> = catalog::products_by_ids(&hosted, &ids)
    .await?
    .into_iter()
    .map(|p| (p.id, p))
    .collect();

  let mut stock_levels = Vec::with_capacity(lines.len());
  for line in &mut lines {
    let product = products
      .get(&line.product_id)
      .ok_or_else(|| AppError::Conflict(format!("'{}' is no longer available.", line.name)))?;
    if !product.in_stock(line.quantity) {
      warn!(product_id = %product.id, wanted = line.quantity, stock = product.stock_quantity, "Insufficient stock at checkout.");
      return Err(AppError::Conflict(format!(
        "Only {} of '{}' left in stock.",
        product.stock_quantity.max(0),
        product.name
      )));
    }
    line.price_cents = product.price_cents;
    line.seller_id = product.seller_id;
    stock_levels.push((product.id, product.stock_quantity));
  }

  let total_cents = checked_total_cents(&lines)
    .ok_or_else(|| AppError::Validation("Order total is too large.".to_string()))?;
  ctx_data.update(|d| {
    d.lines = lines;
    d.total_cents = total_cents;
    d.stock_levels = stock_levels;
  });
  Ok(PipelineControl::Continue)
}

async fn create_order(ctx_data: ContextData<CheckoutCtxData>) -> AppResult<PipelineControl> {
  let (hosted, user_id, total_cents, currency, address) = {
    let guard = ctx_data.read();
    (
      guard.app_state.hosted.clone(),
      guard.user_id,
      guard.total_cents,
      guard.app_state.config.currency.clone(),
      guard.shipping_address.trim().to_string(),
    )
  };
  let order = orders::create_order(&hosted, user_id, total_cents, &currency, Some(&address)).await?;
  info!(order_id = %order.id, total_cents, "Order created.");
  ctx_data.write().order = Some(order);
  Ok(PipelineControl::Continue)
}

async fn discard_order(ctx_data: ContextData<CheckoutCtxData>) -> AppResult<()> {
  let (hosted, order_id) = {
    let guard = ctx_data.read();
    (guard.app_state.hosted.clone(), guard.order.as_ref().map(|o| o.id))
  };
  if let Some(order_id) = order_id {
    warn!(%order_id, "Discarding order after failed checkout.");
    orders::delete_order(&hosted, order_id).await?;
  }
  Ok(())
}

fn order_id_of(ctx_data: &ContextData<CheckoutCtxData>) -> AppResult<uuid::Uuid> {
  ctx_data
    .read()
    .order
    .as_ref()
    .map(|o| o.id)
    .ok_or_else(|| AppError::Internal("order missing from checkout context".to_string()))
}

async fn insert_order_items(ctx_data: ContextData<CheckoutCtxData>) -> AppResult<PipelineControl> {
  let order_id = order_id_of(&ctx_data)?;
  let (hosted, lines) = {
    let guard = ctx_data.read();
    (guard.app_state.hosted.clone(), guard.lines.clone())
  };
  let items = orders::insert_items(&hosted, order_id, &lines).await?;
  ctx_data.write().items = items;
  Ok(PipelineControl::Continue)
}

async fn capture_payment(ctx_data: ContextData<CheckoutCtxData>) -> AppResult<PipelineControl> {
  let order_id = order_id_of(&ctx_data)?;
  let (total_cents, currency, method) = {
    let guard = ctx_data.read();
    (guard.total_cents, guard.app_state.config.currency.clone(), guard.payment_method.clone())
  };
  let receipt = payment_sim::capture_payment(order_id, total_cents, &currency, &method).await?;
  ctx_data.write().payment = Some(receipt);
  Ok(PipelineControl::Continue)
}

async fn mark_order_paid(ctx_data: ContextData<CheckoutCtxData>) -> AppResult<PipelineControl> {
  let order_id = order_id_of(&ctx_data)?;
  let (hosted, reference) = {
    let guard = ctx_data.read();
    (guard.app_state.hosted.clone(), guard.payment.as_ref().map(|p| p.reference.clone()))
  };
  let reference = reference.ok_or_else(|| AppError::Internal("payment receipt missing".to_string()))?;
  let order = orders::mark_paid(&hosted, order_id, &reference).await?;
  ctx_data.write().order = Some(order);
  Ok(PipelineControl::Continue)
}

async fn decrement_stock(ctx_data: ContextData<CheckoutCtxData>) -> AppResult<PipelineControl> {
  let (hosted, lines, levels) = {
    let guard = ctx_data.read();
    (guard.app_state.hosted.clone(), guard.lines.clone(), guard.stock_levels.clone())
  };
  let levels: HashMap<_, _> = levels.into_iter().collect();
  for line in &lines {
    if let Some(stock) = levels.get(&line.product_id) {
      let remaining = stock.saturating_sub(i32::try_from(line.quantity).unwrap_or(i32::MAX)).max(0);
      catalog::set_stock(&hosted, line.product_id, remaining).await?;
    }
  }
  Ok(PipelineControl::Continue)
}

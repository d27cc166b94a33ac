// app/src/services/orders.rs

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::hosted::{Filter, Hosted, Query};
use crate::models::{tables, CartLine, Order, OrderItem, OrderStatus, Seller};

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderItem>,
}

pub async fn create_order(
  hosted: &Hosted,
  user_id: Uuid,
  total_cents: i64,
  currency: &str,
  shipping_address: Option<&str>,
) -> Result<Order> {
  let row = json!({
    "user_id": user_id.to_string(),
    "status": OrderStatus::Pending,
    "total_cents": total_cents,
    "currency": currency,
    "shipping_address": shipping_address,
  });
  Ok(hosted.insert_as(tables::ORDERS, &row).await?)
}

pub async fn delete_order(hosted: &Hosted, order_id: Uuid) -> Result<()> {
  hosted
    .tables
    .delete(tables::ORDER_ITEMS, &[Filter::eq("order_id", order_id.to_string())])
    .await?;
  hosted.tables.delete(tables::ORDERS, &[Filter::eq("id", order_id.to_string())]).await?;
  Ok(())
}

pub async fn insert_items(hosted: &Hosted, order_id: Uuid, lines: &[CartLine]) -> Result<Vec<OrderItem>> {
  let mut items = Vec::with_capacity(lines.len());
  for line in lines {
    let row = json!({
      "order_id": order_id.to_string(),
      "product_id": line.product_id.to_string(),
      "seller_id": line.seller_id.to_string(),
      "quantity": line.quantity,
      "price_cents": line.price_cents,
    });
    items.push(hosted.insert_as(tables::ORDER_ITEMS, &row).await?);
  }
  Ok(items)
}

pub async fn mark_paid(hosted: &Hosted, order_id: Uuid, payment_reference: &str) -> Result<Order> {
  patch_order(hosted, order_id, json!({ "status": OrderStatus::Paid, "payment_reference": payment_reference })).await
}

async fn patch_order(hosted: &Hosted, order_id: Uuid, patch: Value) -> Result<Order> {
  hosted
    .update_as::<Order>(tables::ORDERS, &[Filter::eq("id", order_id.to_string())], patch)
    .await?
    .into_iter()
    .next()
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found.", order_id)))
}

async fn attach_items(hosted: &Hosted, orders: Vec<Order>) -> Result<Vec<OrderWithItems>> {
  if orders.is_empty() {
    return Ok(Vec::new());
  }
  let ids = orders.iter().map(|o| Value::from(o.id.to_string())).collect();
  let items: Vec<OrderItem> = hosted.select_as(tables::ORDER_ITEMS, &Query::new().is_in("order_id", ids)).await?;
  let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
  for item in items {
    by_order.entry(item.order_id).or_default().push(item);
  }
  Ok(
    orders
      .into_iter()
      .map(|order| {
        let items = by_order.remove(&order.id).unwrap_or_default();
        OrderWithItems { order, items }
      })
      .collect(),
  )
}

/// The caller's own orders, newest first.
#[instrument(name = "orders::for_customer", skip(hosted), err(Display))]
pub async fn orders_for_customer(hosted: &Hosted, user_id: Uuid) -> Result<Vec<OrderWithItems>> {
  let query = Query::new().eq("user_id", user_id.to_string()).order_by("created_at", false);
  let orders = hosted.select_as(tables::ORDERS, &query).await?;
  attach_items(hosted, orders).await
}

pub async fn order_for_customer(hosted: &Hosted, user_id: Uuid, order_id: Uuid) -> Result<OrderWithItems> {
  let query = Query::new().eq("id", order_id.to_string()).eq("user_id", user_id.to_string());
  let order: Order = hosted
    .select_one(tables::ORDERS, query)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found.", order_id)))?;
  let mut found = attach_items(hosted, vec![order]).await?;
  found.pop().ok_or_else(|| AppError::Internal("order vanished while loading items".to_string()))
}

/// Order lines that belong to the seller's store.
#[instrument(name = "orders::for_seller", skip(hosted, seller), fields(seller_id = %seller.id), err(Display))]
pub async fn items_for_seller(hosted: &Hosted, seller: &Seller) -> Result<Vec<OrderItem>> {
  Ok(
    hosted
      .select_as(tables::ORDER_ITEMS, &Query::new().eq("seller_id", seller.id.to_string()))
      .await?,
  )
}

pub async fn all_orders(hosted: &Hosted, status: Option<OrderStatus>) -> Result<Vec<Order>> {
  let mut query = Query::new().order_by("created_at", false);
  if let Some(status) = status {
    query = query.eq("status", json!(status));
  }
  Ok(hosted.select_as(tables::ORDERS, &query).await?)
}

#[instrument(name = "orders::set_status", skip(hosted), err(Display))]
pub async fn set_status(hosted: &Hosted, order_id: Uuid, status: OrderStatus) -> Result<Order> {
  patch_order(hosted, order_id, json!({ "status": status })).await
}

// app/src/services/payment_sim.rs

//! Simulated payment capture. Nothing leaves the process; the outcome is
//! decided by the method token so failure paths can be exercised.

use crate::errors::{AppError, Result as AppResult};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

/// Method token that always declines.
pub const DECLINED_METHOD: &str = "card_declined";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentReceipt {
  pub reference: String,
  pub amount_cents: i64,
  pub currency: String,
}

#[instrument(fields(order_id = %order_id, amount_cents, currency))]
pub async fn capture_payment(order_id: Uuid, amount_cents: i64, currency: &str, method: &str) -> AppResult<PaymentReceipt> {
  info!("Simulating payment capture.");
  if amount_cents <= 0 {
    return Err(AppError::Payment("Amount must be greater than zero".to_string()));
  }
  tokio::time::sleep(std::time::Duration::from_millis(5)).await;

  if method == DECLINED_METHOD {
    info!("Simulated payment DECLINED.");
    return Err(AppError::Payment("The card was declined.".to_string()));
  }

  let receipt = PaymentReceipt {
    reference: format!("sim_pay_{}", Uuid::new_v4().simple()),
    amount_cents,
    currency: currency.to_string(),
  };
  info!(reference = %receipt.reference, "Simulated payment SUCCEEDED.");
  Ok(receipt)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn declined_method_fails_with_payment_error() {
    let err = capture_payment(Uuid::new_v4(), 1000, "USD", DECLINED_METHOD).await.unwrap_err();
    assert!(matches!(err, AppError::Payment(_)));
  }

  #[tokio::test]
  async fn zero_amount_is_rejected() {
    assert!(capture_payment(Uuid::new_v4(), 0, "USD", "card").await.is_err());
  }

  #[tokio::test]
  async fn successful_capture_carries_amount() {
    let receipt = capture_payment(Uuid::new_v4(), 2599, "EUR", "card").await.unwrap();
    assert_eq!(receipt.amount_cents, 2599);
    assert_eq!(receipt.currency, "EUR");
    assert!(receipt.reference.starts_with("sim_pay_"));
  }
}

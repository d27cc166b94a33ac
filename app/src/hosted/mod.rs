// app/src/hosted/mod.rs

//! Client seam to the hosted backend-as-a-service.
//!
//! The marketplace owns no database, token protocol or blob store: sign-in,
//! sessions, table rows and uploaded files all live on the hosted platform.
//! This module describes what the app consumes from it as three traits, with
//! a REST implementation for the real platform and an in-memory one for tests
//! and credential-less local runs.

pub mod memory;
pub mod query;
pub mod rest;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryBackend;
pub use query::{Filter, FilterOp, Query};
pub use rest::RestBackend;

#[derive(Debug, Error)]
pub enum HostedError {
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("request rejected with status {status}: {message}")]
  Rejected { status: u16, message: String },

  #[error("transport failure: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("unexpected response body: {0}")]
  Decode(#[from] serde_json::Error),
}

pub type HostedResult<T> = std::result::Result<T, HostedError>;

/// A user as the hosted auth provider knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
  pub id: Uuid,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub user_metadata: Value,
  #[serde(default)]
  pub email_confirmed_at: Option<DateTime<Utc>>,
}

/// Tokens issued by the hosted provider. The app only stores them in cookies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
  pub access_token: String,
  pub refresh_token: String,
  #[serde(default)]
  pub expires_in: i64,
  pub user: AuthUser,
}

/// Result of a sign-up. `session` is absent while the address awaits
/// email confirmation.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
  pub user: AuthUser,
  pub session: Option<AuthSession>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserAttributes {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub password: Option<String>,
  #[serde(rename = "data", skip_serializing_if = "Option::is_none")]
  pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpKind {
  Signup,
  Recovery,
  Email,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
  async fn sign_up(&self, email: &str, password: &str, metadata: Value) -> HostedResult<SignUpOutcome>;

  async fn sign_in_with_password(&self, email: &str, password: &str) -> HostedResult<AuthSession>;

  async fn refresh_session(&self, refresh_token: &str) -> HostedResult<AuthSession>;

  /// Validates an access token and returns its user.
  async fn get_user(&self, access_token: &str) -> HostedResult<AuthUser>;

  async fn update_user(&self, access_token: &str, attributes: &UserAttributes) -> HostedResult<AuthUser>;

  async fn sign_out(&self, access_token: &str) -> HostedResult<()>;

  async fn send_password_reset(&self, email: &str, redirect_to: &str) -> HostedResult<()>;

  async fn verify_otp(&self, email: &str, token: &str, kind: OtpKind) -> HostedResult<AuthSession>;

  fn oauth_authorize_url(&self, provider: &str, redirect_to: &str, code_verifier: &str) -> String;

  async fn exchange_code_for_session(&self, auth_code: &str, code_verifier: &str) -> HostedResult<AuthSession>;

  /// Admin call; removes the auth user entirely.
  async fn delete_user(&self, user_id: Uuid) -> HostedResult<()>;
}

#[async_trait]
pub trait TableStore: Send + Sync {
  async fn select(&self, table: &str, query: &Query) -> HostedResult<Vec<Value>>;

  /// Inserts one row and returns it as stored (with generated columns).
  async fn insert(&self, table: &str, row: Value) -> HostedResult<Value>;

  /// Patches every row matching `filters`; returns the updated rows.
  async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> HostedResult<Vec<Value>>;

  /// Deletes every row matching `filters`; returns how many went away.
  async fn delete(&self, table: &str, filters: &[Filter]) -> HostedResult<usize>;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
  /// Stores (or replaces) an object and returns its public URL.
  async fn upload(&self, bucket: &str, path: &str, content_type: &str, bytes: Vec<u8>) -> HostedResult<String>;
}

/// The three hosted clients the app is built on.
#[derive(Clone)]
pub struct Hosted {
  pub auth: Arc<dyn AuthProvider>,
  pub tables: Arc<dyn TableStore>,
  pub storage: Arc<dyn ObjectStorage>,
}

impl Hosted {
  pub fn from_rest(backend: RestBackend) -> Self {
    let backend = Arc::new(backend);
    Self {
      auth: backend.clone(),
      tables: backend.clone(),
      storage: backend,
    }
  }

  pub fn from_memory(backend: Arc<MemoryBackend>) -> Self {
    Self {
      auth: backend.clone(),
      tables: backend.clone(),
      storage: backend,
    }
  }

  /// Selects rows and decodes them into `T`.
  pub async fn select_as<T: DeserializeOwned>(&self, table: &str, query: &Query) -> HostedResult<Vec<T>> {
    decode_rows(self.tables.select(table, query).await?)
  }

  /// First row matching `query`, if any.
  pub async fn select_one<T: DeserializeOwned>(&self, table: &str, query: Query) -> HostedResult<Option<T>> {
    let rows = self.tables.select(table, &query.limit(1)).await?;
    rows.into_iter().next().map(decode_row).transpose()
  }

  pub async fn insert_as<T: DeserializeOwned, R: Serialize + Sync>(&self, table: &str, row: &R) -> HostedResult<T> {
    decode_row(self.tables.insert(table, serde_json::to_value(row)?).await?)
  }

  pub async fn update_as<T: DeserializeOwned>(&self, table: &str, filters: &[Filter], patch: Value) -> HostedResult<Vec<T>> {
    decode_rows(self.tables.update(table, filters, patch).await?)
  }
}

pub fn decode_row<T: DeserializeOwned>(row: Value) -> HostedResult<T> {
  Ok(serde_json::from_value(row)?)
}

pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> HostedResult<Vec<T>> {
  rows.into_iter().map(decode_row).collect()
}

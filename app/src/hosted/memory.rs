// app/src/hosted/memory.rs

//! In-process stand-in for the hosted platform.
//!
//! Rows are kept as JSON per table and filtered with the same vocabulary the
//! REST backend sends upstream. Accounts are auto-confirmed. A few test hooks
//! (forced insert failures, token expiry, issued recovery/OAuth codes) make the
//! partial-failure and refresh paths reachable from tests.

use super::query::{Filter, FilterOp, Query};
use super::{
  AuthProvider, AuthSession, AuthUser, HostedError, HostedResult, ObjectStorage, OtpKind, SignUpOutcome, TableStore,
  UserAttributes,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

const ACCESS_TOKEN_TTL_SECS: i64 = 3600;

struct Account {
  user: AuthUser,
  password: String,
}

#[derive(Default)]
pub struct MemoryBackend {
  base_url: String,
  accounts: RwLock<HashMap<Uuid, Account>>,
  access_tokens: RwLock<HashMap<String, Uuid>>,
  refresh_tokens: RwLock<HashMap<String, Uuid>>,
  one_time_codes: RwLock<HashMap<String, Uuid>>,
  tables: RwLock<HashMap<String, Vec<Value>>>,
  objects: RwLock<HashMap<String, (String, Vec<u8>)>>,
  failing_tables: RwLock<HashSet<String>>,
  deleted_users: RwLock<Vec<Uuid>>,
}

impl MemoryBackend {
  pub fn new(base_url: &str) -> Self {
    Self {
      base_url: base_url.trim_end_matches('/').to_string(),
      ..Default::default()
    }
  }

  /// Makes every later insert into `table` fail with a 500 rejection.
  pub fn fail_inserts_into(&self, table: &str) {
    self.failing_tables.write().insert(table.to_string());
  }

  /// Invalidates an access token as if it had expired.
  pub fn expire_access_token(&self, access_token: &str) {
    self.access_tokens.write().remove(access_token);
  }

  /// Issues a one-time code for `email` (recovery link or OAuth callback),
  /// creating the account when it does not exist yet.
  pub fn issue_code(&self, email: &str) -> String {
    let user_id = self.find_by_email(email).unwrap_or_else(|| {
      let user = AuthUser {
        id: Uuid::new_v4(),
        email: email.to_string(),
        user_metadata: json!({}),
        email_confirmed_at: Some(Utc::now()),
      };
      let id = user.id;
      self.accounts.write().insert(id, Account { user, password: String::new() });
      id
    });
    let code = Uuid::new_v4().simple().to_string();
    self.one_time_codes.write().insert(code.clone(), user_id);
    code
  }

  pub fn auth_user_exists(&self, user_id: Uuid) -> bool {
    self.accounts.read().contains_key(&user_id)
  }

  pub fn deleted_users(&self) -> Vec<Uuid> {
    self.deleted_users.read().clone()
  }

  pub fn rows(&self, table: &str) -> Vec<Value> {
    self.tables.read().get(table).cloned().unwrap_or_default()
  }

  pub fn object(&self, bucket: &str, path: &str) -> Option<(String, Vec<u8>)> {
    self.objects.read().get(&format!("{}/{}", bucket, path)).cloned()
  }

  fn find_by_email(&self, email: &str) -> Option<Uuid> {
    self
      .accounts
      .read()
      .values()
      .find(|a| a.user.email.eq_ignore_ascii_case(email))
      .map(|a| a.user.id)
  }

  fn issue_session(&self, user_id: Uuid) -> HostedResult<AuthSession> {
    let user = self
      .accounts
      .read()
      .get(&user_id)
      .map(|a| a.user.clone())
      .ok_or_else(|| HostedError::NotFound("user not found".to_string()))?;
    let access_token = format!("at-{}", Uuid::new_v4().simple());
    let refresh_token = format!("rt-{}", Uuid::new_v4().simple());
    self.access_tokens.write().insert(access_token.clone(), user_id);
    self.refresh_tokens.write().insert(refresh_token.clone(), user_id);
    Ok(AuthSession {
      access_token,
      refresh_token,
      expires_in: ACCESS_TOKEN_TTL_SECS,
      user,
    })
  }

  fn user_for_token(&self, access_token: &str) -> HostedResult<Uuid> {
    self
      .access_tokens
      .read()
      .get(access_token)
      .copied()
      .ok_or_else(|| HostedError::Unauthorized("invalid JWT: token is expired or unknown".to_string()))
  }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
  match (a, b) {
    (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
    (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
    (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
    (Value::Null, Value::Null) => Some(Ordering::Equal),
    _ => None,
  }
}

fn matches(row: &Value, filter: &Filter) -> bool {
  let cell = row.get(&filter.column).unwrap_or(&Value::Null);
  let ord = compare(cell, &filter.value);
  match filter.op {
    FilterOp::Eq => ord == Some(Ordering::Equal),
    FilterOp::Neq => ord != Some(Ordering::Equal),
    FilterOp::Gt => ord == Some(Ordering::Greater),
    FilterOp::Gte => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
    FilterOp::Lt => ord == Some(Ordering::Less),
    FilterOp::Lte => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
    FilterOp::ILikeContains => match (cell.as_str(), filter.value.as_str()) {
      (Some(text), Some(term)) => text.to_lowercase().contains(&term.to_lowercase()),
      _ => false,
    },
    FilterOp::In => match &filter.value {
      Value::Array(values) => values.iter().any(|v| compare(cell, v) == Some(Ordering::Equal)),
      _ => false,
    },
  }
}

fn matches_all(row: &Value, filters: &[Filter]) -> bool {
  filters.iter().all(|f| matches(row, f))
}

#[async_trait]
impl AuthProvider for MemoryBackend {
  async fn sign_up(&self, email: &str, password: &str, metadata: Value) -> HostedResult<SignUpOutcome> {
    if self.find_by_email(email).is_some() {
      return Err(HostedError::Conflict("User already registered".to_string()));
    }
    let user = AuthUser {
      id: Uuid::new_v4(),
      email: email.to_string(),
      user_metadata: metadata,
      email_confirmed_at: Some(Utc::now()),
    };
    let user_id = user.id;
    self.accounts.write().insert(
      user_id,
      Account {
        user: user.clone(),
        password: password.to_string(),
      },
    );
    debug!(%user_id, "Memory backend created auth user.");
    Ok(SignUpOutcome {
      user,
      session: Some(self.issue_session(user_id)?),
    })
  }

  async fn sign_in_with_password(&self, email: &str, password: &str) -> HostedResult<AuthSession> {
    let user_id = {
      let accounts = self.accounts.read();
      accounts
        .values()
        .find(|a| a.user.email.eq_ignore_ascii_case(email) && !a.password.is_empty() && a.password == password)
        .map(|a| a.user.id)
    };
    match user_id {
      Some(id) => self.issue_session(id),
      None => Err(HostedError::Unauthorized("Invalid login credentials".to_string())),
    }
  }

  async fn refresh_session(&self, refresh_token: &str) -> HostedResult<AuthSession> {
    // Refresh tokens are single use.
    let user_id = self
      .refresh_tokens
      .write()
      .remove(refresh_token)
      .ok_or_else(|| HostedError::Unauthorized("Invalid Refresh Token".to_string()))?;
    self.issue_session(user_id)
  }

  async fn get_user(&self, access_token: &str) -> HostedResult<AuthUser> {
    let user_id = self.user_for_token(access_token)?;
    self
      .accounts
      .read()
      .get(&user_id)
      .map(|a| a.user.clone())
      .ok_or_else(|| HostedError::Unauthorized("user no longer exists".to_string()))
  }

  async fn update_user(&self, access_token: &str, attributes: &UserAttributes) -> HostedResult<AuthUser> {
    let user_id = self.user_for_token(access_token)?;
    let mut accounts = self.accounts.write();
    let account = accounts
      .get_mut(&user_id)
      .ok_or_else(|| HostedError::Unauthorized("user no longer exists".to_string()))?;
    if let Some(email) = &attributes.email {
      account.user.email = email.clone();
    }
    if let Some(password) = &attributes.password {
      account.password = password.clone();
    }
    if let Some(Value::Object(patch)) = &attributes.metadata {
      if !account.user.user_metadata.is_object() {
        account.user.user_metadata = json!({});
      }
      if let Value::Object(existing) = &mut account.user.user_metadata {
        for (k, v) in patch {
          existing.insert(k.clone(), v.clone());
        }
      }
    }
    Ok(account.user.clone())
  }

  async fn sign_out(&self, access_token: &str) -> HostedResult<()> {
    let user_id = self.user_for_token(access_token)?;
    self.access_tokens.write().retain(|_, id| *id != user_id);
    self.refresh_tokens.write().retain(|_, id| *id != user_id);
    Ok(())
  }

  async fn send_password_reset(&self, email: &str, redirect_to: &str) -> HostedResult<()> {
    // Unknown addresses are accepted silently, like the platform does.
    debug!(email, redirect_to, known = self.find_by_email(email).is_some(), "Memory backend password reset requested.");
    Ok(())
  }

  async fn verify_otp(&self, email: &str, token: &str, _kind: OtpKind) -> HostedResult<AuthSession> {
    let user_id = self
      .one_time_codes
      .write()
      .remove(token)
      .ok_or_else(|| HostedError::Unauthorized("Token has expired or is invalid".to_string()))?;
    if self.find_by_email(email) != Some(user_id) {
      return Err(HostedError::Unauthorized("Token has expired or is invalid".to_string()));
    }
    self.issue_session(user_id)
  }

  fn oauth_authorize_url(&self, provider: &str, redirect_to: &str, code_verifier: &str) -> String {
    format!(
      "{}/auth/v1/authorize?provider={}&redirect_to={}&code_challenge={}&code_challenge_method=plain",
      self.base_url,
      urlencoding::encode(provider),
      urlencoding::encode(redirect_to),
      urlencoding::encode(code_verifier),
    )
  }

  async fn exchange_code_for_session(&self, auth_code: &str, _code_verifier: &str) -> HostedResult<AuthSession> {
    let user_id = self
      .one_time_codes
      .write()
      .remove(auth_code)
      .ok_or_else(|| HostedError::Unauthorized("invalid flow state, no valid flow state found".to_string()))?;
    self.issue_session(user_id)
  }

  async fn delete_user(&self, user_id: Uuid) -> HostedResult<()> {
    if self.accounts.write().remove(&user_id).is_none() {
      return Err(HostedError::NotFound("User not found".to_string()));
    }
    self.access_tokens.write().retain(|_, id| *id != user_id);
    self.refresh_tokens.write().retain(|_, id| *id != user_id);
    self.deleted_users.write().push(user_id);
    Ok(())
  }
}

#[async_trait]
impl TableStore for MemoryBackend {
  async fn select(&self, table: &str, query: &Query) -> HostedResult<Vec<Value>> {
    let mut rows: Vec<Value> = self
      .tables
      .read()
      .get(table)
      .map(|rows| rows.iter().filter(|r| matches_all(r, &query.filters)).cloned().collect())
      .unwrap_or_default();

    // Later orderings act as tie-breakers.
    rows.sort_by(|a, b| {
      for order in &query.order {
        let left = a.get(&order.column).unwrap_or(&Value::Null);
        let right = b.get(&order.column).unwrap_or(&Value::Null);
        let ord = compare(left, right).unwrap_or(Ordering::Equal);
        let ord = if order.ascending { ord } else { ord.reverse() };
        if ord != Ordering::Equal {
          return ord;
        }
      }
      Ordering::Equal
    });

    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(usize::MAX);
    Ok(rows.into_iter().skip(offset).take(limit).collect())
  }

  async fn insert(&self, table: &str, mut row: Value) -> HostedResult<Value> {
    if self.failing_tables.read().contains(table) {
      return Err(HostedError::Rejected {
        status: 500,
        message: format!("insert into '{}' failed", table),
      });
    }
    let Value::Object(fields) = &mut row else {
      return Err(HostedError::Rejected {
        status: 400,
        message: "row must be a JSON object".to_string(),
      });
    };
    fields
      .entry("id")
      .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    fields
      .entry("created_at")
      .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));

    let mut tables = self.tables.write();
    let rows = tables.entry(table.to_string()).or_default();
    let id = row.get("id").cloned();
    if rows.iter().any(|r| r.get("id") == id.as_ref()) {
      return Err(HostedError::Conflict(format!(
        "duplicate key value violates unique constraint \"{}_pkey\"",
        table
      )));
    }
    rows.push(row.clone());
    Ok(row)
  }

  async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> HostedResult<Vec<Value>> {
    let Value::Object(patch) = patch else {
      return Err(HostedError::Rejected {
        status: 400,
        message: "patch must be a JSON object".to_string(),
      });
    };
    let mut tables = self.tables.write();
    let mut updated = Vec::new();
    if let Some(rows) = tables.get_mut(table) {
      for row in rows.iter_mut().filter(|r| matches_all(r, filters)) {
        if let Value::Object(fields) = row {
          for (k, v) in &patch {
            fields.insert(k.clone(), v.clone());
          }
        }
        updated.push(row.clone());
      }
    }
    Ok(updated)
  }

  async fn delete(&self, table: &str, filters: &[Filter]) -> HostedResult<usize> {
    let mut tables = self.tables.write();
    let Some(rows) = tables.get_mut(table) else {
      return Ok(0);
    };
    let before = rows.len();
    rows.retain(|r| !matches_all(r, filters));
    Ok(before - rows.len())
  }
}

#[async_trait]
impl ObjectStorage for MemoryBackend {
  async fn upload(&self, bucket: &str, path: &str, content_type: &str, bytes: Vec<u8>) -> HostedResult<String> {
    self
      .objects
      .write()
      .insert(format!("{}/{}", bucket, path), (content_type.to_string(), bytes));
    Ok(format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn select_filters_orders_and_pages() {
    let backend = MemoryBackend::new("http://local");
    for (name, price) in [("Desk Lamp", 2500), ("Floor lamp", 8000), ("Chair", 4000)] {
      backend
        .insert("products", json!({ "name": name, "price_cents": price }))
        .await
        .unwrap();
    }

    let lamps = backend
      .select("products", &Query::new().ilike_contains("name", "LAMP").order_by("price_cents", false))
      .await
      .unwrap();
    let names: Vec<&str> = lamps.iter().filter_map(|r| r["name"].as_str()).collect();
    assert_eq!(names, vec!["Floor lamp", "Desk Lamp"]);

    let page = backend
      .select("products", &Query::new().order_by("price_cents", true).offset(1).limit(1))
      .await
      .unwrap();
    assert_eq!(page[0]["name"], "Chair");
  }

  #[tokio::test]
  async fn refresh_tokens_are_single_use() {
    let backend = MemoryBackend::new("http://local");
    let outcome = backend.sign_up("a@example.com", "password1", json!({})).await.unwrap();
    let session = outcome.session.unwrap();

    backend.refresh_session(&session.refresh_token).await.unwrap();
    assert!(matches!(
      backend.refresh_session(&session.refresh_token).await,
      Err(HostedError::Unauthorized(_))
    ));
  }

  #[tokio::test]
  async fn forced_insert_failure_is_a_rejection() {
    let backend = MemoryBackend::new("http://local");
    backend.fail_inserts_into("users");
    let err = backend.insert("users", json!({ "email": "x" })).await.unwrap_err();
    assert!(matches!(err, HostedError::Rejected { status: 500, .. }));
  }
}

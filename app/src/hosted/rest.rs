// app/src/hosted/rest.rs

//! `reqwest` client for a Supabase-compatible platform: GoTrue under
//! `/auth/v1`, PostgREST under `/rest/v1`, object storage under `/storage/v1`.

use super::{
  AuthProvider, AuthSession, AuthUser, Filter, HostedError, HostedResult, ObjectStorage, OtpKind, Query,
  SignUpOutcome, TableStore, UserAttributes,
};
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

pub struct RestBackend {
  client: Client,
  base_url: String,
  anon_key: String,
  service_key: String,
}

impl RestBackend {
  pub fn new(base_url: &str, anon_key: &str, service_key: &str) -> HostedResult<Self> {
    let client = Client::builder().user_agent("marketplace-server").build()?;
    Ok(Self {
      client,
      base_url: base_url.trim_end_matches('/').to_string(),
      anon_key: anon_key.to_string(),
      service_key: service_key.to_string(),
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }

  /// Public auth endpoints: anon key only.
  fn anon(&self, builder: RequestBuilder) -> RequestBuilder {
    builder.header("apikey", &self.anon_key)
  }

  /// Calls made on behalf of a signed-in user.
  fn as_user(&self, builder: RequestBuilder, access_token: &str) -> RequestBuilder {
    builder.header("apikey", &self.anon_key).bearer_auth(access_token)
  }

  /// Server-side table, storage and admin calls.
  fn as_service(&self, builder: RequestBuilder) -> RequestBuilder {
    builder.header("apikey", &self.service_key).bearer_auth(&self.service_key)
  }

  fn table_url(&self, table: &str) -> String {
    self.url(&format!("/rest/v1/{}", table))
  }

  fn public_object_url(&self, bucket: &str, path: &str) -> String {
    self.url(&format!("/storage/v1/object/public/{}/{}", bucket, path))
  }
}

/// Turns a non-success response into a `HostedError`, keeping the platform's
/// own message.
async fn check(response: Response) -> HostedResult<Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }
  let body = response.text().await.unwrap_or_default();
  let message = extract_message(&body);
  debug!(status = status.as_u16(), %message, "Hosted service rejected request.");
  Err(classify(status, message))
}

fn extract_message(body: &str) -> String {
  serde_json::from_str::<Value>(body)
    .ok()
    .and_then(|v| {
      ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
    })
    .unwrap_or_else(|| body.to_string())
}

fn classify(status: StatusCode, message: String) -> HostedError {
  match status {
    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => HostedError::Unauthorized(message),
    StatusCode::NOT_FOUND => HostedError::NotFound(message),
    StatusCode::CONFLICT => HostedError::Conflict(message),
    StatusCode::UNPROCESSABLE_ENTITY if message.to_lowercase().contains("already") => HostedError::Conflict(message),
    // GoTrue answers bad credentials with 400 invalid_grant.
    StatusCode::BAD_REQUEST if message.to_lowercase().contains("invalid login") => HostedError::Unauthorized(message),
    other => HostedError::Rejected {
      status: other.as_u16(),
      message,
    },
  }
}

fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
  filters.iter().map(Filter::to_param).collect()
}

#[async_trait]
impl AuthProvider for RestBackend {
  #[instrument(name = "hosted::sign_up", skip(self, password, metadata), err(Display))]
  async fn sign_up(&self, email: &str, password: &str, metadata: Value) -> HostedResult<SignUpOutcome> {
    let response = self
      .anon(self.client.post(self.url("/auth/v1/signup")))
      .json(&json!({ "email": email, "password": password, "data": metadata }))
      .send()
      .await?;
    let body: Value = check(response).await?.json().await?;

    // With auto-confirm on, the platform answers with a full session;
    // otherwise with the bare (unconfirmed) user.
    if body.get("access_token").is_some() {
      let session: AuthSession = serde_json::from_value(body)?;
      Ok(SignUpOutcome {
        user: session.user.clone(),
        session: Some(session),
      })
    } else {
      let user_value = body.get("user").cloned().unwrap_or(body);
      Ok(SignUpOutcome {
        user: serde_json::from_value(user_value)?,
        session: None,
      })
    }
  }

  #[instrument(name = "hosted::sign_in_with_password", skip(self, password), err(Display))]
  async fn sign_in_with_password(&self, email: &str, password: &str) -> HostedResult<AuthSession> {
    let response = self
      .anon(self.client.post(self.url("/auth/v1/token")))
      .query(&[("grant_type", "password")])
      .json(&json!({ "email": email, "password": password }))
      .send()
      .await?;
    Ok(check(response).await?.json().await?)
  }

  #[instrument(name = "hosted::refresh_session", skip_all, err(Display))]
  async fn refresh_session(&self, refresh_token: &str) -> HostedResult<AuthSession> {
    let response = self
      .anon(self.client.post(self.url("/auth/v1/token")))
      .query(&[("grant_type", "refresh_token")])
      .json(&json!({ "refresh_token": refresh_token }))
      .send()
      .await?;
    Ok(check(response).await?.json().await?)
  }

  #[instrument(name = "hosted::get_user", skip_all, err(Display))]
  async fn get_user(&self, access_token: &str) -> HostedResult<AuthUser> {
    let response = self
      .as_user(self.client.get(self.url("/auth/v1/user")), access_token)
      .send()
      .await?;
    Ok(check(response).await?.json().await?)
  }

  #[instrument(name = "hosted::update_user", skip_all, err(Display))]
  async fn update_user(&self, access_token: &str, attributes: &UserAttributes) -> HostedResult<AuthUser> {
    let response = self
      .as_user(self.client.put(self.url("/auth/v1/user")), access_token)
      .json(attributes)
      .send()
      .await?;
    Ok(check(response).await?.json().await?)
  }

  #[instrument(name = "hosted::sign_out", skip_all, err(Display))]
  async fn sign_out(&self, access_token: &str) -> HostedResult<()> {
    let response = self
      .as_user(self.client.post(self.url("/auth/v1/logout")), access_token)
      .send()
      .await?;
    check(response).await?;
    Ok(())
  }

  #[instrument(name = "hosted::send_password_reset", skip(self), err(Display))]
  async fn send_password_reset(&self, email: &str, redirect_to: &str) -> HostedResult<()> {
    let response = self
      .anon(self.client.post(self.url("/auth/v1/recover")))
      .query(&[("redirect_to", redirect_to)])
      .json(&json!({ "email": email }))
      .send()
      .await?;
    check(response).await?;
    Ok(())
  }

  #[instrument(name = "hosted::verify_otp", skip(self, token), err(Display))]
  async fn verify_otp(&self, email: &str, token: &str, kind: OtpKind) -> HostedResult<AuthSession> {
    let response = self
      .anon(self.client.post(self.url("/auth/v1/verify")))
      .json(&json!({ "type": kind, "email": email, "token": token }))
      .send()
      .await?;
    Ok(check(response).await?.json().await?)
  }

  fn oauth_authorize_url(&self, provider: &str, redirect_to: &str, code_verifier: &str) -> String {
    format!(
      "{}?provider={}&redirect_to={}&code_challenge={}&code_challenge_method=plain",
      self.url("/auth/v1/authorize"),
      urlencoding::encode(provider),
      urlencoding::encode(redirect_to),
      urlencoding::encode(code_verifier),
    )
  }

  #[instrument(name = "hosted::exchange_code_for_session", skip_all, err(Display))]
  async fn exchange_code_for_session(&self, auth_code: &str, code_verifier: &str) -> HostedResult<AuthSession> {
    let response = self
      .anon(self.client.post(self.url("/auth/v1/token")))
      .query(&[("grant_type", "pkce")])
      .json(&json!({ "auth_code": auth_code, "code_verifier": code_verifier }))
      .send()
      .await?;
    Ok(check(response).await?.json().await?)
  }

  #[instrument(name = "hosted::delete_user", skip(self), err(Display))]
  async fn delete_user(&self, user_id: Uuid) -> HostedResult<()> {
    let response = self
      .as_service(self.client.delete(self.url(&format!("/auth/v1/admin/users/{}", user_id))))
      .send()
      .await?;
    check(response).await?;
    Ok(())
  }
}

#[async_trait]
impl TableStore for RestBackend {
  #[instrument(name = "hosted::select", skip(self, query), err(Display))]
  async fn select(&self, table: &str, query: &Query) -> HostedResult<Vec<Value>> {
    let response = self
      .as_service(self.client.get(self.table_url(table)))
      .query(&query.to_params())
      .send()
      .await?;
    Ok(check(response).await?.json().await?)
  }

  #[instrument(name = "hosted::insert", skip(self, row), err(Display))]
  async fn insert(&self, table: &str, row: Value) -> HostedResult<Value> {
    let response = self
      .as_service(self.client.post(self.table_url(table)))
      .header("Prefer", "return=representation")
      .json(&row)
      .send()
      .await?;
    let rows: Vec<Value> = check(response).await?.json().await?;
    rows.into_iter().next().ok_or_else(|| HostedError::Rejected {
      status: 200,
      message: format!("insert into '{}' returned no row", table),
    })
  }

  #[instrument(name = "hosted::update", skip(self, patch), err(Display))]
  async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> HostedResult<Vec<Value>> {
    if filters.is_empty() {
      warn!(table, "Refusing unfiltered update.");
      return Err(HostedError::Rejected {
        status: 400,
        message: "update requires at least one filter".to_string(),
      });
    }
    let response = self
      .as_service(self.client.patch(self.table_url(table)))
      .query(&filter_params(filters))
      .header("Prefer", "return=representation")
      .json(&patch)
      .send()
      .await?;
    Ok(check(response).await?.json().await?)
  }

  #[instrument(name = "hosted::delete", skip(self), err(Display))]
  async fn delete(&self, table: &str, filters: &[Filter]) -> HostedResult<usize> {
    if filters.is_empty() {
      warn!(table, "Refusing unfiltered delete.");
      return Err(HostedError::Rejected {
        status: 400,
        message: "delete requires at least one filter".to_string(),
      });
    }
    let response = self
      .as_service(self.client.delete(self.table_url(table)))
      .query(&filter_params(filters))
      .header("Prefer", "return=representation")
      .send()
      .await?;
    let removed: Vec<Value> = check(response).await?.json().await?;
    Ok(removed.len())
  }
}

#[async_trait]
impl ObjectStorage for RestBackend {
  #[instrument(name = "hosted::upload", skip(self, bytes), fields(size = bytes.len()), err(Display))]
  async fn upload(&self, bucket: &str, path: &str, content_type: &str, bytes: Vec<u8>) -> HostedResult<String> {
    let response = self
      .as_service(self.client.post(self.url(&format!("/storage/v1/object/{}/{}", bucket, path))))
      .header(header::CONTENT_TYPE, content_type)
      .header("x-upsert", "true")
      .body(bytes)
      .send()
      .await?;
    check(response).await?;
    Ok(self.public_object_url(bucket, path))
  }
}

// app/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

/// Which hosted-service implementation the server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
  /// The real platform over HTTP.
  Rest,
  /// In-process stand-in for local runs without credentials.
  Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub app_base_url: String,

  pub backend: BackendKind,
  pub hosted_url: String,
  pub hosted_anon_key: String,
  pub hosted_service_key: String,
  pub storage_bucket: String,

  pub session_cookie_prefix: String,
  pub cookie_secure: bool,
  pub currency: String,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let app_base_url = get_env("APP_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));

    let backend = match get_env("HOSTED_BACKEND").unwrap_or_else(|_| "rest".to_string()).as_str() {
      "rest" => BackendKind::Rest,
      "memory" => BackendKind::Memory,
      other => return Err(AppError::Config(format!("Unknown HOSTED_BACKEND '{}'", other))),
    };

    // The in-memory backend needs no credentials.
    let (hosted_url, hosted_anon_key, hosted_service_key) = match backend {
      BackendKind::Rest => (
        get_env("HOSTED_URL")?.trim_end_matches('/').to_string(),
        get_env("HOSTED_ANON_KEY")?,
        get_env("HOSTED_SERVICE_KEY")?,
      ),
      BackendKind::Memory => (
        get_env("HOSTED_URL").unwrap_or_else(|_| app_base_url.clone()),
        String::new(),
        String::new(),
      ),
    };

    let storage_bucket = get_env("STORAGE_BUCKET").unwrap_or_else(|_| "marketplace".to_string());
    let session_cookie_prefix = get_env("SESSION_COOKIE_PREFIX").unwrap_or_else(|_| "mp".to_string());
    let cookie_secure = get_env("COOKIE_SECURE")
      .unwrap_or_else(|_| "false".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid COOKIE_SECURE value: {}", e)))?;
    let currency = get_env("CURRENCY").unwrap_or_else(|_| "USD".to_string());

    tracing::info!(backend = ?backend, "Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      app_base_url,
      backend,
      hosted_url,
      hosted_anon_key,
      hosted_service_key,
      storage_bucket,
      session_cookie_prefix,
      cookie_secure,
      currency,
    })
  }

  /// Configuration for tests and local runs against the in-memory backend.
  pub fn for_memory_backend() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      app_base_url: "http://127.0.0.1:8080".to_string(),
      backend: BackendKind::Memory,
      hosted_url: "http://127.0.0.1:8080".to_string(),
      hosted_anon_key: String::new(),
      hosted_service_key: String::new(),
      storage_bucket: "marketplace".to_string(),
      session_cookie_prefix: "mp".to_string(),
      cookie_secure: false,
      currency: "USD".to_string(),
    }
  }

  pub fn access_cookie_name(&self) -> String {
    format!("{}-access-token", self.session_cookie_prefix)
  }

  pub fn refresh_cookie_name(&self) -> String {
    format!("{}-refresh-token", self.session_cookie_prefix)
  }

  /// Holds the PKCE verifier between the OAuth redirect and its callback.
  pub fn code_verifier_cookie_name(&self) -> String {
    format!("{}-code-verifier", self.session_cookie_prefix)
  }
}

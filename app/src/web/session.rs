// app/src/web/session.rs

//! Cookie-backed session: reading the token pair off a request, validating
//! or refreshing it against the hosted provider, and writing cookies back.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::hosted::{AuthSession, AuthUser, Hosted, HostedError};

// Lifetime of the refresh cookie; the access cookie follows the token's expiry.
const REFRESH_COOKIE_DAYS: i64 = 30;

/// A validated session, stored in request extensions by the middleware.
#[derive(Debug, Clone)]
pub struct Session {
  pub access_token: String,
  pub refresh_token: String,
  pub user: AuthUser,
}

impl From<&AuthSession> for Session {
  fn from(s: &AuthSession) -> Self {
    Self {
      access_token: s.access_token.clone(),
      refresh_token: s.refresh_token.clone(),
      user: s.user.clone(),
    }
  }
}

#[derive(Debug, Default)]
pub struct SessionResolution {
  pub session: Option<Session>,
  /// New tokens to write back when the access token had to be refreshed.
  pub refreshed: Option<AuthSession>,
  /// Cookies were present but nothing valid could be made of them.
  pub stale: bool,
}

/// Resolves the caller's session from cookies.
///
/// The access token is checked first; if it is rejected, the refresh token
/// (single use on the provider) is exchanged for a new pair. Upstream
/// failures other than a rejection leave the cookies alone.
pub async fn resolve(hosted: &Hosted, config: &AppConfig, req: &HttpRequest) -> SessionResolution {
  let access = req.cookie(&config.access_cookie_name()).map(|c| c.value().to_string());
  let refresh = req.cookie(&config.refresh_cookie_name()).map(|c| c.value().to_string());
  if access.is_none() && refresh.is_none() {
    return SessionResolution::default();
  }

  if let Some(access_token) = access.filter(|t| !t.is_empty()) {
    match hosted.auth.get_user(&access_token).await {
      Ok(user) => {
        return SessionResolution {
          session: Some(Session {
            access_token,
            refresh_token: refresh.unwrap_or_default(),
            user,
          }),
          ..Default::default()
        };
      }
      Err(HostedError::Unauthorized(reason)) => debug!(%reason, "Access token rejected."),
      Err(e) => {
        warn!(error = %e, "Session lookup failed; treating request as anonymous.");
        return SessionResolution::default();
      }
    }
  }

  if let Some(refresh_token) = refresh.filter(|t| !t.is_empty()) {
    match hosted.auth.refresh_session(&refresh_token).await {
      Ok(new_session) => {
        debug!(user_id = %new_session.user.id, "Session refreshed.");
        return SessionResolution {
          session: Some(Session::from(&new_session)),
          refreshed: Some(new_session),
          stale: false,
        };
      }
      Err(HostedError::Unauthorized(reason)) => debug!(%reason, "Refresh token rejected."),
      Err(e) => {
        warn!(error = %e, "Session refresh failed; treating request as anonymous.");
        return SessionResolution::default();
      }
    }
  }

  SessionResolution {
    stale: true,
    ..Default::default()
  }
}

fn base_cookie<'c>(config: &AppConfig, name: String, value: String) -> Cookie<'c> {
  Cookie::build(name, value)
    .path("/")
    .http_only(true)
    .secure(config.cookie_secure)
    .same_site(SameSite::Lax)
    .finish()
}

/// Access and refresh cookies for a freshly issued session.
pub fn session_cookies(config: &AppConfig, session: &AuthSession) -> [Cookie<'static>; 2] {
  let mut access = base_cookie(config, config.access_cookie_name(), session.access_token.clone());
  if session.expires_in > 0 {
    access.set_max_age(Duration::seconds(session.expires_in));
  }
  let mut refresh = base_cookie(config, config.refresh_cookie_name(), session.refresh_token.clone());
  refresh.set_max_age(Duration::days(REFRESH_COOKIE_DAYS));
  [access, refresh]
}

pub fn removal_cookies(config: &AppConfig) -> [Cookie<'static>; 2] {
  [config.access_cookie_name(), config.refresh_cookie_name()].map(|name| removal_cookie(config, name))
}

pub fn removal_cookie(config: &AppConfig, name: String) -> Cookie<'static> {
  let mut cookie = base_cookie(config, name, String::new());
  cookie.make_removal();
  cookie
}

pub fn verifier_cookie(config: &AppConfig, verifier: &str) -> Cookie<'static> {
  let mut cookie = base_cookie(config, config.code_verifier_cookie_name(), verifier.to_string());
  cookie.set_max_age(Duration::minutes(10));
  cookie
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::Value;
  use uuid::Uuid;

  fn issued(expires_in: i64) -> AuthSession {
    AuthSession {
      access_token: "at".to_string(),
      refresh_token: "rt".to_string(),
      expires_in,
      user: AuthUser {
        id: Uuid::new_v4(),
        email: "jo@example.com".to_string(),
        user_metadata: Value::Null,
        email_confirmed_at: None,
      },
    }
  }

  #[test]
  fn session_cookies_use_configured_prefix() {
    let config = AppConfig::for_memory_backend();
    let [access, refresh] = session_cookies(&config, &issued(3600));
    assert_eq!(access.name(), config.access_cookie_name());
    assert_eq!(access.value(), "at");
    assert_eq!(access.max_age(), Some(Duration::seconds(3600)));
    assert_eq!(refresh.name(), config.refresh_cookie_name());
    assert_eq!(refresh.http_only(), Some(true));
    assert_eq!(refresh.path(), Some("/"));
  }

  #[test]
  fn removal_cookies_expire_immediately() {
    let config = AppConfig::for_memory_backend();
    for cookie in removal_cookies(&config) {
      assert_eq!(cookie.value(), "");
      assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
  }
}

// app/src/web/guard.rs

//! Route protection rules applied to every request before it reaches a
//! handler.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::Role;
use crate::services::users::RoleDirectory;

/// Pages for signed-out visitors only.
pub const AUTH_ROUTES: &[&str] = &["/login", "/register", "/forgot-password"];

/// Pages that need a session.
pub const PROTECTED_ROUTES: &[&str] = &[
  "/dashboard",
  "/customer",
  "/profile",
  "/checkout",
  "/orders",
  "/wishlist",
  "/complete-profile",
  "/reset-password",
];

/// Prefixes that additionally need the matching stored role.
pub const ROLE_ROUTES: &[(&str, Role)] = &[("/seller", Role::Seller), ("/admin", Role::Admin)];

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";
pub const SIGNED_IN_LANDING: &str = "/dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
  Allow,
  Redirect(String),
}

/// `path` is `route` itself or lies below it.
fn under(path: &str, route: &str) -> bool {
  path == route || path.strip_prefix(route).is_some_and(|rest| rest.starts_with('/'))
}

/// Assets are never gated.
pub fn is_static(path: &str) -> bool {
  const PREFIXES: &[&str] = &["/static/", "/_next/", "/assets/"];
  const EXTENSIONS: &[&str] = &[".ico", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".css", ".js"];
  PREFIXES.iter().any(|p| path.starts_with(p)) || EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

pub fn is_auth_route(path: &str) -> bool {
  AUTH_ROUTES.iter().any(|r| under(path, r))
}

pub fn required_role(path: &str) -> Option<Role> {
  ROLE_ROUTES.iter().find(|(prefix, _)| under(path, prefix)).map(|(_, role)| *role)
}

pub fn is_protected(path: &str) -> bool {
  PROTECTED_ROUTES.iter().any(|r| under(path, r)) || required_role(path).is_some()
}

pub fn login_redirect(path: &str) -> String {
  format!("{}?redirect={}", LOGIN_PATH, urlencoding::encode(path))
}

/// Decides what happens to a request for `path` from a caller identified by
/// `user_id` (None when signed out).
///
/// A role lookup failure is treated like a role mismatch.
pub async fn evaluate(path: &str, user_id: Option<Uuid>, roles: &dyn RoleDirectory) -> GateDecision {
  if is_static(path) {
    return GateDecision::Allow;
  }

  let Some(user_id) = user_id else {
    if is_protected(path) {
      debug!(path, "Anonymous request to protected path.");
      return GateDecision::Redirect(login_redirect(path));
    }
    return GateDecision::Allow;
  };

  if is_auth_route(path) {
    return GateDecision::Redirect(SIGNED_IN_LANDING.to_string());
  }

  if let Some(required) = required_role(path) {
    return match roles.role_of(user_id).await {
      Ok(Some(role)) if role == required => GateDecision::Allow,
      Ok(stored) => {
        debug!(path, %user_id, ?stored, %required, "Role mismatch.");
        GateDecision::Redirect(UNAUTHORIZED_PATH.to_string())
      }
      Err(e) => {
        warn!(path, %user_id, error = %e, "Role lookup failed; denying.");
        GateDecision::Redirect(UNAUTHORIZED_PATH.to_string())
      }
    };
  }

  GateDecision::Allow
}

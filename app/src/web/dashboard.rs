// app/src/web/dashboard.rs

//! Dashboard routing by stored role, and the sidebar each role sees.

use serde::Serialize;

use crate::hosted::AuthUser;
use crate::models::{Role, UserRow};
use crate::services::auth_service::CurrentUser;

pub const COMPLETE_PROFILE_PATH: &str = "/complete-profile";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
  pub label: &'static str,
  pub href: &'static str,
}

const fn nav(label: &'static str, href: &'static str) -> NavItem {
  NavItem { label, href }
}

const CUSTOMER_NAV: &[NavItem] = &[
  nav("Overview", "/customer"),
  nav("Orders", "/customer/orders"),
  nav("Wishlist", "/customer/wishlist"),
  nav("Cart", "/customer/cart"),
  nav("Profile", "/customer/profile"),
];

const SELLER_NAV: &[NavItem] = &[
  nav("Overview", "/seller"),
  nav("Products", "/seller/products"),
  nav("Orders", "/seller/orders"),
  nav("Store settings", "/seller/settings"),
];

const ADMIN_NAV: &[NavItem] = &[
  nav("Overview", "/admin"),
  nav("Users", "/admin/users"),
  nav("Sellers", "/admin/sellers"),
  nav("Orders", "/admin/orders"),
  nav("Categories", "/admin/categories"),
];

pub fn nav_for(role: Role) -> &'static [NavItem] {
  match role {
    Role::Customer => CUSTOMER_NAV,
    Role::Seller => SELLER_NAV,
    Role::Admin => ADMIN_NAV,
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardShell {
  pub role: Role,
  pub user: CurrentUser,
  /// Sub-path below the role root, empty for the overview.
  pub section: String,
  pub nav: &'static [NavItem],
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardRoute {
  Redirect(String),
  Render(DashboardShell),
}

/// Where a request for the `segment` dashboard ends up, given the session's
/// user and their `users` row.
pub fn resolve_dashboard(user: Option<&AuthUser>, row: Option<&UserRow>, segment: Role, section: &str) -> DashboardRoute {
  let Some(user) = user else {
    return DashboardRoute::Redirect("/login".to_string());
  };
  let Some(row) = row else {
    return DashboardRoute::Redirect(COMPLETE_PROFILE_PATH.to_string());
  };
  if row.role != segment {
    return DashboardRoute::Redirect(row.role.root_path().to_string());
  }
  DashboardRoute::Render(DashboardShell {
    role: row.role,
    user: CurrentUser::from_parts(user, Some(row)),
    section: section.trim_matches('/').to_string(),
    nav: nav_for(row.role),
  })
}

/// Target of `/dashboard`.
pub fn landing_for(row: Option<&UserRow>) -> &'static str {
  row.map_or(COMPLETE_PROFILE_PATH, |r| r.role.root_path())
}

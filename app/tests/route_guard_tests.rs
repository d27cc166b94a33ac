// app/tests/route_guard_tests.rs

mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use marketplace::models::Role;
use marketplace::web::build_app;
use serde_json::Value;

use common::*;

#[actix_web::test]
async fn anonymous_protected_request_redirects_to_login_with_original_path() {
  let (state, _backend) = memory_state();
  let app = test::init_service(build_app(state)).await;

  for (path, expected) in [
    ("/dashboard", "/login?redirect=%2Fdashboard"),
    ("/customer/orders", "/login?redirect=%2Fcustomer%2Forders"),
    ("/seller/products", "/login?redirect=%2Fseller%2Fproducts"),
    ("/admin", "/login?redirect=%2Fadmin"),
  ] {
    let resp = test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
    assert_eq!(location(&resp).as_deref(), Some(expected), "{path}");
  }
}

#[actix_web::test]
async fn public_pages_are_served_to_anonymous_visitors() {
  let (state, _backend) = memory_state();
  let app = test::init_service(build_app(state)).await;

  let resp = test::call_service(&app, test::TestRequest::get().uri("/login?redirect=/seller").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["page"], "login");
  assert_eq!(body["redirect"], "/seller");

  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn signed_in_user_is_sent_from_auth_pages_to_dashboard() {
  let (state, _backend) = memory_state();
  let (auth_session, _) = seed_user(&state, "cora@example.com", Role::Customer).await;
  let [access, refresh] = cookies_for(&state, &auth_session);
  let app = test::init_service(build_app(state)).await;

  for path in ["/login", "/register", "/forgot-password"] {
    let req = test::TestRequest::get()
      .uri(path)
      .cookie(access.clone())
      .cookie(refresh.clone())
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
    assert_eq!(location(&resp).as_deref(), Some("/dashboard"), "{path}");
  }
}

#[actix_web::test]
async fn seller_on_admin_path_is_sent_to_unauthorized() {
  let (state, _backend) = memory_state();
  let (auth_session, _) = seed_user(&state, "sam@example.com", Role::Seller).await;
  let [access, _] = cookies_for(&state, &auth_session);
  let app = test::init_service(build_app(state)).await;

  let req = test::TestRequest::get().uri("/admin/users").cookie(access.clone()).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
  assert_eq!(location(&resp).as_deref(), Some("/unauthorized"));

  let req = test::TestRequest::get().uri("/seller/products").cookie(access).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let shell: Value = test::read_body_json(resp).await;
  assert_eq!(shell["role"], "seller");
  assert_eq!(shell["section"], "products");
  assert_eq!(shell["nav"][1]["href"], "/seller/products");
}

#[actix_web::test]
async fn dashboard_forwards_to_stored_role_root() {
  let (state, _backend) = memory_state();
  let (customer, _) = seed_user(&state, "cora@example.com", Role::Customer).await;
  let (admin, _) = seed_user(&state, "ada@example.com", Role::Admin).await;
  let bare = seed_bare_account(&state, "new@example.com").await;
  let cases = [(customer, "/customer"), (admin, "/admin"), (bare, "/complete-profile")];
  let cookies: Vec<_> = cases.iter().map(|(s, to)| (cookies_for(&state, s), *to)).collect();
  let app = test::init_service(build_app(state)).await;

  for ([access, _], expected) in cookies {
    let req = test::TestRequest::get().uri("/dashboard").cookie(access).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp).as_deref(), Some(expected));
  }
}

#[actix_web::test]
async fn seller_visiting_customer_dashboard_lands_on_seller_root() {
  let (state, _backend) = memory_state();
  let (seller, _) = seed_user(&state, "sam@example.com", Role::Seller).await;
  let [access, _] = cookies_for(&state, &seller);
  let app = test::init_service(build_app(state)).await;

  let req = test::TestRequest::get().uri("/customer/wishlist").cookie(access).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
  assert_eq!(location(&resp).as_deref(), Some("/seller"));
}

#[actix_web::test]
async fn expired_access_token_is_refreshed_and_cookies_reissued() {
  let (state, backend) = memory_state();
  let (auth_session, _) = seed_user(&state, "cora@example.com", Role::Customer).await;
  backend.expire_access_token(&auth_session.access_token);
  let [access, refresh] = cookies_for(&state, &auth_session);
  let access_name = state.config.access_cookie_name();
  let refresh_name = state.config.refresh_cookie_name();
  let app = test::init_service(build_app(state)).await;

  let req = test::TestRequest::get()
    .uri("/customer")
    .cookie(access)
    .cookie(refresh)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let new_access = response_cookie(&resp, &access_name).expect("access cookie reissued");
  let new_refresh = response_cookie(&resp, &refresh_name).expect("refresh cookie reissued");
  assert_ne!(new_access.value(), auth_session.access_token);
  assert_ne!(new_refresh.value(), auth_session.refresh_token);
}

#[actix_web::test]
async fn unusable_cookies_are_cleared() {
  let (state, backend) = memory_state();
  let (auth_session, _) = seed_user(&state, "cora@example.com", Role::Customer).await;
  backend.expire_access_token(&auth_session.access_token);
  // Spend the refresh token so nothing can be recovered.
  state.hosted.auth.refresh_session(&auth_session.refresh_token).await.unwrap();
  let [access, refresh] = cookies_for(&state, &auth_session);
  let access_name = state.config.access_cookie_name();
  let app = test::init_service(build_app(state)).await;

  let req = test::TestRequest::get()
    .uri("/dashboard")
    .cookie(access)
    .cookie(refresh)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(location(&resp).as_deref(), Some("/login?redirect=%2Fdashboard"));
  let cleared = response_cookie(&resp, &access_name).expect("removal cookie");
  assert_eq!(cleared.value(), "");
}

#[actix_web::test]
async fn api_requires_session_and_role() {
  let (state, _backend) = memory_state();
  let (customer, _) = seed_user(&state, "cora@example.com", Role::Customer).await;
  let [access, _] = cookies_for(&state, &customer);
  let app = test::init_service(build_app(state)).await;

  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/me").to_request()).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::get().uri("/api/v1/seller/products").cookie(access.clone()).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let req = test::TestRequest::get().uri("/api/v1/me").cookie(access).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let me: Value = test::read_body_json(resp).await;
  assert_eq!(me["email"], "cora@example.com");
  assert_eq!(me["role"], "customer");
  assert_eq!(me["full_name"], "Test User");
}

// app/tests/auth_flow_tests.rs

mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use marketplace::models::{tables, Role};
use marketplace::web::build_app;
use serde_json::{json, Value};

use common::*;

fn register_body(email: &str, role: &str, store_name: Option<&str>) -> Value {
  json!({
    "email": email,
    "password": PASSWORD,
    "full_name": "Robin Reg",
    "role": role,
    "store_name": store_name,
  })
}

#[actix_web::test]
async fn customer_registration_creates_rows_and_signs_in() {
  let (state, backend) = memory_state();
  let access_name = state.config.access_cookie_name();
  let app = test::init_service(build_app(state)).await;

  let req = test::TestRequest::post()
    .uri("/register")
    .set_json(register_body("robin@example.com", "customer", None))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(location(&resp).as_deref(), Some("/customer"));
  assert!(response_cookie(&resp, &access_name).is_some_and(|c| !c.value().is_empty()));

  let users = backend.rows(tables::USERS);
  assert_eq!(users.len(), 1);
  assert_eq!(users[0]["role"], "customer");
  assert_eq!(users[0]["full_name"], "Robin Reg");
  assert_eq!(backend.rows(tables::PROFILES).len(), 1);
  assert!(backend.rows(tables::SELLERS).is_empty());
}

#[actix_web::test]
async fn seller_registration_needs_a_store_name() {
  let (state, backend) = memory_state();
  let app = test::init_service(build_app(state)).await;

  let req = test::TestRequest::post()
    .uri("/register")
    .set_json(register_body("sam@example.com", "seller", None))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert!(backend.rows(tables::USERS).is_empty());

  let req = test::TestRequest::post()
    .uri("/register")
    .set_json(register_body("sam@example.com", "seller", Some("Sam's Shed")))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(location(&resp).as_deref(), Some("/seller"));
  let sellers = backend.rows(tables::SELLERS);
  assert_eq!(sellers.len(), 1);
  assert_eq!(sellers[0]["store_name"], "Sam's Shed");
  assert_eq!(sellers[0]["approved"], false);
}

#[actix_web::test]
async fn admin_role_cannot_be_self_assigned() {
  let (state, backend) = memory_state();
  let app = test::init_service(build_app(state.clone())).await;

  let req = test::TestRequest::post()
    .uri("/register")
    .set_json(register_body("eve@example.com", "admin", None))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  assert!(backend.rows(tables::USERS).is_empty());
  // Rejected before any account was created.
  assert!(state.hosted.auth.sign_in_with_password("eve@example.com", PASSWORD).await.is_err());
}

#[actix_web::test]
async fn failed_users_insert_removes_the_auth_user() {
  let (state, backend) = memory_state();
  backend.fail_inserts_into(tables::USERS);
  let app = test::init_service(build_app(state.clone())).await;

  let req = test::TestRequest::post()
    .uri("/register")
    .set_json(register_body("robin@example.com", "customer", None))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

  let deleted = backend.deleted_users();
  assert_eq!(deleted.len(), 1);
  assert!(!backend.auth_user_exists(deleted[0]));
  assert!(state.hosted.auth.sign_in_with_password("robin@example.com", PASSWORD).await.is_err());
}

#[actix_web::test]
async fn failed_companion_insert_unwinds_users_row_and_auth_user() {
  let (state, backend) = memory_state();
  backend.fail_inserts_into(tables::PROFILES);
  let app = test::init_service(build_app(state)).await;

  let req = test::TestRequest::post()
    .uri("/register")
    .set_json(register_body("robin@example.com", "customer", None))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert!(resp.status().is_server_error());
  assert!(backend.rows(tables::USERS).is_empty());
  assert_eq!(backend.deleted_users().len(), 1);
}

#[actix_web::test]
async fn duplicate_registration_is_a_conflict() {
  let (state, _backend) = memory_state();
  seed_user(&state, "robin@example.com", Role::Customer).await;
  let app = test::init_service(build_app(state)).await;

  let req = test::TestRequest::post()
    .uri("/register")
    .set_json(register_body("robin@example.com", "customer", None))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn sign_in_follows_safe_redirects_only() {
  let (state, _backend) = memory_state();
  seed_user(&state, "cora@example.com", Role::Customer).await;
  let app = test::init_service(build_app(state)).await;

  for (redirect, expected) in [
    (Some("/customer/orders"), "/customer/orders"),
    (Some("//evil.example"), "/dashboard"),
    (Some("/\t/evil.example"), "/dashboard"),
    (Some("/\r\n/evil.example"), "/dashboard"),
    (None, "/customer"),
  ] {
    let req = test::TestRequest::post()
      .uri("/login")
      .set_json(json!({ "email": "cora@example.com", "password": PASSWORD, "redirect": redirect }))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some(expected));
  }
}

#[actix_web::test]
async fn wrong_password_is_rejected_with_generic_message() {
  let (state, _backend) = memory_state();
  seed_user(&state, "cora@example.com", Role::Customer).await;
  let app = test::init_service(build_app(state)).await;

  let req = test::TestRequest::post()
    .uri("/login")
    .set_json(json!({ "email": "cora@example.com", "password": "not-the-password" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["error"].as_str().unwrap().contains("Invalid email or password"));
}

#[actix_web::test]
async fn logout_clears_cookies_and_revokes_session() {
  let (state, _backend) = memory_state();
  let (auth_session, _) = seed_user(&state, "cora@example.com", Role::Customer).await;
  let [access, refresh] = cookies_for(&state, &auth_session);
  let access_name = state.config.access_cookie_name();
  let app = test::init_service(build_app(state.clone())).await;

  let req = test::TestRequest::post().uri("/logout").cookie(access).cookie(refresh).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(location(&resp).as_deref(), Some("/login"));
  assert_eq!(response_cookie(&resp, &access_name).map(|c| c.value().to_string()), Some(String::new()));
  assert!(state.hosted.auth.get_user(&auth_session.access_token).await.is_err());
}

#[actix_web::test]
async fn recovery_link_signs_in_and_password_can_be_reset() {
  let (state, backend) = memory_state();
  seed_user(&state, "cora@example.com", Role::Customer).await;
  let access_name = state.config.access_cookie_name();
  let app = test::init_service(build_app(state.clone())).await;

  let code = backend.issue_code("cora@example.com");
  let uri = format!("/auth/confirm?email=cora%40example.com&token={}&type=recovery", code);
  let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(location(&resp).as_deref(), Some("/reset-password"));
  let access = response_cookie(&resp, &access_name).expect("session cookie");

  let req = test::TestRequest::post()
    .uri("/reset-password")
    .cookie(access)
    .set_json(json!({ "password": "brand-new-secret", "confirm_password": "brand-new-secret" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert!(state
    .hosted
    .auth
    .sign_in_with_password("cora@example.com", "brand-new-secret")
    .await
    .is_ok());

  // Codes are single use.
  let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn forgot_password_answers_the_same_for_unknown_addresses() {
  let (state, _backend) = memory_state();
  let app = test::init_service(build_app(state)).await;

  let req = test::TestRequest::post()
    .uri("/forgot-password")
    .set_json(json!({ "email": "nobody@example.com" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let req = test::TestRequest::post()
    .uri("/forgot-password")
    .set_json(json!({ "email": "not-an-email" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn oauth_round_trip_then_complete_profile() {
  let (state, backend) = memory_state();
  let verifier_name = state.config.code_verifier_cookie_name();
  let access_name = state.config.access_cookie_name();
  let app = test::init_service(build_app(state)).await;

  let resp = test::call_service(&app, test::TestRequest::get().uri("/auth/oauth/github").to_request()).await;
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  let authorize = location(&resp).unwrap();
  assert!(authorize.contains("/auth/v1/authorize?provider=github"));
  let verifier = response_cookie(&resp, &verifier_name).expect("verifier cookie");

  // Without the verifier the code is refused.
  let code = backend.issue_code("octo@example.com");
  let uri = format!("/auth/callback?code={}", code);
  let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let code = backend.issue_code("octo@example.com");
  let uri = format!("/auth/callback?code={}", code);
  let req = test::TestRequest::get().uri(&uri).cookie(verifier).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(location(&resp).as_deref(), Some("/dashboard"));
  let access = response_cookie(&resp, &access_name).expect("session cookie");
  assert_eq!(response_cookie(&resp, &verifier_name).map(|c| c.value().to_string()), Some(String::new()));

  let req = test::TestRequest::get().uri("/dashboard").cookie(access.clone()).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(location(&resp).as_deref(), Some("/complete-profile"));

  let req = test::TestRequest::post()
    .uri("/complete-profile")
    .cookie(access.clone())
    .set_json(json!({ "full_name": "Octo Cat", "role": "admin" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let req = test::TestRequest::post()
    .uri("/complete-profile")
    .cookie(access.clone())
    .set_json(json!({ "full_name": "Octo Cat", "role": "customer" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(location(&resp).as_deref(), Some("/customer"));
  assert_eq!(backend.rows(tables::USERS).len(), 1);

  let req = test::TestRequest::get().uri("/complete-profile").cookie(access).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(location(&resp).as_deref(), Some("/customer"));
}

#[actix_web::test]
async fn unknown_oauth_provider_is_rejected() {
  let (state, _backend) = memory_state();
  let app = test::init_service(build_app(state)).await;
  let resp = test::call_service(&app, test::TestRequest::get().uri("/auth/oauth/myspace").to_request()).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

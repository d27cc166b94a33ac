// app/tests/seller_admin_tests.rs

mod common;

use actix_web::http::header::CONTENT_TYPE;
use actix_web::http::StatusCode;
use actix_web::test;
use marketplace::models::{tables, Role};
use marketplace::web::build_app;
use serde_json::{json, Value};

use common::*;

#[actix_web::test]
async fn seller_manages_only_their_own_products() {
  let (state, backend) = memory_state();
  let (seller, _) = seed_user(&state, "sam@example.com", Role::Seller).await;
  let (rival, _) = seed_user(&state, "rita@example.com", Role::Seller).await;
  let rival_store = seller_of(&state, rival.user.id).await;
  let foreign = seed_product(&state, &rival_store, "Rival Mug", 900, 3).await;
  let [access, _] = cookies_for(&state, &seller);
  let app = test::init_service(build_app(state)).await;

  let req = test::TestRequest::post()
    .uri("/api/v1/seller/products")
    .cookie(access.clone())
    .set_json(json!({ "name": "Teapot", "price_cents": 3200, "stock_quantity": 4 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let created: Value = test::read_body_json(resp).await;
  let id = created["id"].as_str().unwrap().to_string();

  let req = test::TestRequest::patch()
    .uri(&format!("/api/v1/seller/products/{}", id))
    .cookie(access.clone())
    .set_json(json!({ "price_cents": 2900 }))
    .to_request();
  let updated: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(updated["price_cents"], 2900);
  assert_eq!(updated["name"], "Teapot");

  let req = test::TestRequest::get().uri("/api/v1/seller/products").cookie(access.clone()).to_request();
  let listed: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(listed["products"].as_array().unwrap().len(), 1);

  let req = test::TestRequest::patch()
    .uri(&format!("/api/v1/seller/products/{}", foreign.id))
    .cookie(access.clone())
    .set_json(json!({ "price_cents": 1 }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

  let req = test::TestRequest::delete()
    .uri(&format!("/api/v1/seller/products/{}", foreign.id))
    .cookie(access.clone())
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
  assert_eq!(backend.rows(tables::PRODUCTS).len(), 2);

  let req = test::TestRequest::delete()
    .uri(&format!("/api/v1/seller/products/{}", id))
    .cookie(access)
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
  assert_eq!(backend.rows(tables::PRODUCTS).len(), 1);
}

#[actix_web::test]
async fn seller_rejects_invalid_product_input() {
  let (state, _backend) = memory_state();
  let (seller, _) = seed_user(&state, "sam@example.com", Role::Seller).await;
  let [access, _] = cookies_for(&state, &seller);
  let app = test::init_service(build_app(state)).await;

  let req = test::TestRequest::post()
    .uri("/api/v1/seller/products")
    .cookie(access)
    .set_json(json!({ "name": "Freebie", "price_cents": 0, "stock_quantity": 1 }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn customer_cannot_use_seller_or_admin_api() {
  let (state, _backend) = memory_state();
  let (customer, _) = seed_user(&state, "cora@example.com", Role::Customer).await;
  let [access, _] = cookies_for(&state, &customer);
  let app = test::init_service(build_app(state)).await;

  for uri in ["/api/v1/seller/products", "/api/v1/admin/users"] {
    let req = test::TestRequest::get().uri(uri).cookie(access.clone()).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN, "{}", uri);
  }
}

#[actix_web::test]
async fn product_image_upload_is_stored_and_linked() {
  let (state, backend) = memory_state();
  let (seller, _) = seed_user(&state, "sam@example.com", Role::Seller).await;
  let store = seller_of(&state, seller.user.id).await;
  let lamp = seed_product(&state, &store, "Desk Lamp", 2500, 5).await;
  let [access, _] = cookies_for(&state, &seller);
  let app = test::init_service(build_app(state.clone())).await;

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/seller/products/{}/image", lamp.id))
    .cookie(access.clone())
    .insert_header((CONTENT_TYPE, "image/png"))
    .set_payload(vec![0x89, b'P', b'N', b'G'])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let product: Value = test::read_body_json(resp).await;
  let url = product["image_url"].as_str().unwrap();
  let prefix = format!("products/{}/{}-", store.id, lamp.id);
  let path = url.split(&format!("/{}/", state.config.storage_bucket)).nth(1).unwrap();
  assert!(path.starts_with(&prefix));
  assert!(backend.object(&state.config.storage_bucket, path).is_some());

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/seller/products/{}/image", lamp.id))
    .cookie(access)
    .insert_header((CONTENT_TYPE, "application/pdf"))
    .set_payload(vec![1, 2, 3])
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn avatar_upload_sets_avatar_url() {
  let (state, backend) = memory_state();
  let (customer, _) = seed_user(&state, "cora@example.com", Role::Customer).await;
  let [access, _] = cookies_for(&state, &customer);
  let app = test::init_service(build_app(state.clone())).await;

  let req = test::TestRequest::post()
    .uri("/api/v1/me/avatar")
    .cookie(access.clone())
    .insert_header((CONTENT_TYPE, "image/jpeg"))
    .set_payload(vec![0xFF, 0xD8, 0xFF])
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  let url = body["avatarUrl"].as_str().unwrap().to_string();
  assert!(url.ends_with(&format!("avatars/{}.jpg", customer.user.id)));

  let path = format!("avatars/{}.jpg", customer.user.id);
  let (content_type, bytes) = backend.object(&state.config.storage_bucket, &path).unwrap();
  assert_eq!(content_type, "image/jpeg");
  assert_eq!(bytes.len(), 3);

  let req = test::TestRequest::get().uri("/api/v1/me").cookie(access).to_request();
  let me: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(me["avatar_url"], url.as_str());
}

#[actix_web::test]
async fn admin_lists_users_and_changes_roles() {
  let (state, _backend) = memory_state();
  let (admin, _) = seed_user(&state, "ada@example.com", Role::Admin).await;
  let (_, customer_row) = seed_user(&state, "cora@example.com", Role::Customer).await;
  seed_user(&state, "sam@example.com", Role::Seller).await;
  let [access, _] = cookies_for(&state, &admin);
  let app = test::init_service(build_app(state)).await;

  let req = test::TestRequest::get().uri("/api/v1/admin/users").cookie(access.clone()).to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["users"].as_array().unwrap().len(), 3);
  assert_eq!(body["perPage"], 25);

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/admin/users?page={}", usize::MAX))
    .cookie(access.clone())
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["users"].as_array().unwrap().is_empty());

  let req = test::TestRequest::get()
    .uri("/api/v1/admin/users?role=seller")
    .cookie(access.clone())
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["users"].as_array().unwrap().len(), 1);

  let req = test::TestRequest::put()
    .uri(&format!("/api/v1/admin/users/{}/role", customer_row.id))
    .cookie(access.clone())
    .set_json(json!({ "role": "seller" }))
    .to_request();
  let row: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(row["role"], "seller");

  let req = test::TestRequest::put()
    .uri(&format!("/api/v1/admin/users/{}/role", admin.user.id))
    .cookie(access)
    .set_json(json!({ "role": "customer" }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn promoted_user_gets_a_working_seller_account() {
  let (state, backend) = memory_state();
  let (admin, _) = seed_user(&state, "ada@example.com", Role::Admin).await;
  let (customer, customer_row) = seed_user(&state, "cora@example.com", Role::Customer).await;
  let [admin_access, _] = cookies_for(&state, &admin);
  let [customer_access, _] = cookies_for(&state, &customer);
  let app = test::init_service(build_app(state)).await;

  let set_role = |role: &str| {
    test::TestRequest::put()
      .uri(&format!("/api/v1/admin/users/{}/role", customer_row.id))
      .cookie(admin_access.clone())
      .set_json(json!({ "role": role }))
      .to_request()
  };
  assert_eq!(test::call_service(&app, set_role("seller")).await.status(), StatusCode::OK);

  let req = test::TestRequest::get().uri("/api/v1/seller/store").cookie(customer_access.clone()).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let store: Value = test::read_body_json(resp).await;
  assert_eq!(store["store_name"], "Test User's store");
  assert_eq!(store["approved"], false);

  let req = test::TestRequest::post()
    .uri("/api/v1/seller/products")
    .cookie(customer_access)
    .set_json(json!({ "name": "Teapot", "price_cents": 3200, "stock_quantity": 4 }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

  // Demoting and promoting again reuses the existing rows.
  assert_eq!(test::call_service(&app, set_role("customer")).await.status(), StatusCode::OK);
  assert_eq!(test::call_service(&app, set_role("seller")).await.status(), StatusCode::OK);
  assert_eq!(backend.rows(tables::SELLERS).len(), 1);
  assert_eq!(backend.rows(tables::PROFILES).len(), 1);
}

#[actix_web::test]
async fn admin_approves_sellers_and_moves_orders() {
  let (state, _backend) = memory_state();
  let (admin, _) = seed_user(&state, "ada@example.com", Role::Admin).await;
  let (seller, _) = seed_user(&state, "sam@example.com", Role::Seller).await;
  let store = seller_of(&state, seller.user.id).await;
  let lamp = seed_product(&state, &store, "Desk Lamp", 2500, 5).await;
  let (customer, _) = seed_user(&state, "cora@example.com", Role::Customer).await;
  let [admin_access, _] = cookies_for(&state, &admin);
  let [customer_access, _] = cookies_for(&state, &customer);
  let [seller_access, _] = cookies_for(&state, &seller);
  let app = test::init_service(build_app(state)).await;

  let req = test::TestRequest::get()
    .uri("/api/v1/admin/sellers?approved=false")
    .cookie(admin_access.clone())
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["sellers"].as_array().unwrap().len(), 1);

  let req = test::TestRequest::put()
    .uri(&format!("/api/v1/admin/sellers/{}/approval", store.id))
    .cookie(admin_access.clone())
    .set_json(json!({ "approved": true }))
    .to_request();
  let approved: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(approved["approved"], true);

  let req = test::TestRequest::post()
    .uri("/api/v1/cart/items")
    .cookie(customer_access.clone())
    .set_json(json!({ "product_id": lamp.id }))
    .to_request();
  test::call_service(&app, req).await;
  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .cookie(customer_access)
    .set_json(json!({ "shipping_address": "1 Main St", "payment_method": "card" }))
    .to_request();
  let placed: Value = test::read_body_json(test::call_service(&app, req).await).await;
  let order_id = placed["order"]["id"].as_str().unwrap().to_string();

  let req = test::TestRequest::get().uri("/api/v1/seller/orders").cookie(seller_access).to_request();
  let sold: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(sold["items"].as_array().unwrap().len(), 1);

  let req = test::TestRequest::put()
    .uri(&format!("/api/v1/admin/orders/{}/status", order_id))
    .cookie(admin_access.clone())
    .set_json(json!({ "status": "shipped" }))
    .to_request();
  let order: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(order["status"], "shipped");

  let req = test::TestRequest::get()
    .uri("/api/v1/admin/orders?status=shipped")
    .cookie(admin_access)
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["orders"].as_array().unwrap().len(), 1);
}

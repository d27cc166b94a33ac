// app/src/web/routes.rs

use actix_web::web;

use crate::services::storage::MAX_IMAGE_BYTES;
use crate::web::handlers::{
  admin_handlers, auth_handlers, cart_handlers, checkout_handlers, page_handlers, product_handlers, profile_handlers,
  seller_handlers, wishlist_handlers,
};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// Upload bodies may exceed the default payload limit.
fn upload_limit() -> web::PayloadConfig {
  web::PayloadConfig::new(MAX_IMAGE_BYTES + 1)
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  configure_pages(cfg);
  configure_auth_actions(cfg);
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/me")
          .route("", web::get().to(profile_handlers::me_handler))
          .route("", web::put().to(profile_handlers::update_profile_handler))
          .route("/profile", web::get().to(profile_handlers::get_profile_handler))
          .service(
            web::resource("/avatar")
              .app_data(upload_limit())
              .route(web::post().to(profile_handlers::upload_avatar_handler)),
          ),
      )
      .service(
        web::scope("/products")
          .route("", web::get().to(product_handlers::list_products_handler))
          .route("/{product_id}", web::get().to(product_handlers::get_product_handler)),
      )
      .route("/categories", web::get().to(product_handlers::list_categories_handler))
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::get_cart_handler))
          .route("", web::delete().to(cart_handlers::clear_cart_handler))
          .route("/items", web::post().to(cart_handlers::add_to_cart_handler))
          .route("/items/{product_id}", web::put().to(cart_handlers::set_quantity_handler))
          .route("/items/{product_id}", web::delete().to(cart_handlers::remove_from_cart_handler)),
      )
      .route("/checkout", web::post().to(checkout_handlers::checkout_handler))
      .service(
        web::scope("/orders")
          .route("", web::get().to(checkout_handlers::list_orders_handler))
          .route("/{order_id}", web::get().to(checkout_handlers::get_order_handler)),
      )
      .service(
        web::scope("/wishlist")
          .route("", web::get().to(wishlist_handlers::list_wishlist_handler))
          .route("", web::post().to(wishlist_handlers::add_to_wishlist_handler))
          .route("/{product_id}", web::delete().to(wishlist_handlers::remove_from_wishlist_handler)),
      )
      .service(
        web::scope("/seller")
          .route("/store", web::get().to(seller_handlers::store_handler))
          .route("/products", web::get().to(seller_handlers::list_products_handler))
          .route("/products", web::post().to(seller_handlers::create_product_handler))
          .route("/products/{product_id}", web::patch().to(seller_handlers::update_product_handler))
          .route("/products/{product_id}", web::delete().to(seller_handlers::delete_product_handler))
          .service(
            web::resource("/products/{product_id}/image")
              .app_data(upload_limit())
              .route(web::post().to(seller_handlers::upload_product_image_handler)),
          )
          .route("/orders", web::get().to(seller_handlers::list_orders_handler)),
      )
      .service(
        web::scope("/admin")
          .route("/users", web::get().to(admin_handlers::list_users_handler))
          .route("/users/{user_id}/role", web::put().to(admin_handlers::set_role_handler))
          .route("/sellers", web::get().to(admin_handlers::list_sellers_handler))
          .route("/sellers/{seller_id}/approval", web::put().to(admin_handlers::set_seller_approval_handler))
          .route("/orders", web::get().to(admin_handlers::list_orders_handler))
          .route("/orders/{order_id}/status", web::put().to(admin_handlers::set_order_status_handler))
          .route("/categories", web::post().to(admin_handlers::create_category_handler)),
      ),
  );
}

fn configure_pages(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/login", web::get().to(page_handlers::login_page))
    .route("/register", web::get().to(page_handlers::register_page))
    .route("/forgot-password", web::get().to(page_handlers::forgot_password_page))
    .route("/reset-password", web::get().to(page_handlers::reset_password_page))
    .route("/unauthorized", web::get().to(page_handlers::unauthorized_page))
    .route("/complete-profile", web::get().to(page_handlers::complete_profile_page))
    .route("/dashboard", web::get().to(page_handlers::dashboard_page))
    .service(
      web::resource([
        "/customer",
        "/customer/{tail:.*}",
        "/seller",
        "/seller/{tail:.*}",
        "/admin",
        "/admin/{tail:.*}",
      ])
      .route(web::get().to(page_handlers::role_dashboard_page)),
    );
}

fn configure_auth_actions(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/login", web::post().to(auth_handlers::signin_handler))
    .route("/register", web::post().to(auth_handlers::signup_handler))
    .route("/logout", web::post().to(auth_handlers::signout_handler))
    .route("/forgot-password", web::post().to(auth_handlers::forgot_password_handler))
    .route("/reset-password", web::post().to(auth_handlers::reset_password_handler))
    .route("/complete-profile", web::post().to(auth_handlers::complete_profile_handler))
    .service(
      web::scope("/auth")
        .route("/oauth/{provider}", web::get().to(auth_handlers::oauth_start_handler))
        .route("/callback", web::get().to(auth_handlers::oauth_callback_handler))
        .route("/confirm", web::get().to(auth_handlers::confirm_handler)),
    );
}

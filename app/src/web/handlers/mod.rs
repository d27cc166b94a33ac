// app/src/web/handlers/mod.rs

pub mod admin_handlers;
pub mod auth_handlers;
pub mod cart_handlers;
pub mod checkout_handlers;
pub mod page_handlers;
pub mod product_handlers;
pub mod profile_handlers;
pub mod seller_handlers;
pub mod wishlist_handlers;

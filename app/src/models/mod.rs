// app/src/models/mod.rs

//! View models for rows of the hosted tables. The schema and its
//! constraints live on the hosted store.

pub mod cart_item;
pub mod category;
pub mod order;
pub mod order_item;
pub mod product;
pub mod profile;
pub mod seller;
pub mod user;
pub mod wishlist;

pub use cart_item::{checked_total_cents, CartLine};
pub use category::Category;
pub use order::{Order, OrderStatus};
pub use order_item::OrderItem;
pub use product::Product;
pub use profile::Profile;
pub use seller::Seller;
pub use user::{Role, UserRow};
pub use wishlist::WishlistItem;

/// Table names on the hosted store.
pub mod tables {
  pub const USERS: &str = "users";
  pub const PROFILES: &str = "profiles";
  pub const SELLERS: &str = "sellers";
  pub const CATEGORIES: &str = "categories";
  pub const PRODUCTS: &str = "products";
  pub const ORDERS: &str = "orders";
  pub const ORDER_ITEMS: &str = "order_items";
  pub const WISHLIST: &str = "wishlist";
}

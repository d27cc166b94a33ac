// app/src/services/mod.rs

//! Thin services over the hosted clients. Each function performs the one or
//! two remote calls a screen needs; multi-call flows live in `pipelines`.

pub mod auth_service;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod payment_sim;
pub mod storage;
pub mod users;
pub mod wishlist;

// app/src/lib.rs

//! Multi-role marketplace (customers, sellers, admins) served over a hosted
//! backend-as-a-service.

pub mod config;
pub mod errors;
pub mod hosted;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod web;

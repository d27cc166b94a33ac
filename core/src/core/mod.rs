// core/src/core/mod.rs

pub mod context_data;
pub mod control;
pub mod handler;
pub mod step;

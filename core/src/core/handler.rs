// core/src/core/handler.rs

//! Boxed handler types stored by a [`Pipeline`](crate::Pipeline).

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<O> = Pin<Box<dyn Future<Output = O> + Send>>;

/// A step handler. It receives a clone of the run's context handle and
/// resolves to a control signal or the pipeline's error type.
pub type Handler<TData, Err> =
  Box<dyn Fn(ContextData<TData>) -> BoxFuture<Result<PipelineControl, Err>> + Send + Sync>;

/// Undoes the side effect of a completed step after a later step failed.
pub type Compensator<TData, Err> = Box<dyn Fn(ContextData<TData>) -> BoxFuture<Result<(), Err>> + Send + Sync>;

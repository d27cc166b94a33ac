// core/src/pipeline/hooks.rs

//! Registration of step handlers and compensators.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use crate::core::handler::{Compensator, Handler};
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use std::future::Future;

impl<TData, Err> Pipeline<TData, Err>
where
  TData: Send + Sync + 'static,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Appends a handler to `step_name`. Handlers of one step run in
  /// registration order.
  ///
  /// The handler's own error type only has to convert into the pipeline's
  /// `Err`, so steps can return e.g. a service error directly.
  pub fn on<F, UserErr>(&mut self, step_name: &str, handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + 'static,
  {
    self.step_index(step_name);
    let handler: Handler<TData, Err> = Box::new(move |ctx_data| {
      let fut = handler_fn(ctx_data);
      Box::pin(async move { fut.await.map_err(Into::into) })
    });
    self.on.entry(step_name.to_string()).or_default().push(handler);
  }

  /// Sets the compensator of `step_name`, replacing any previous one.
  ///
  /// It runs only if the step completed and a later non-optional step failed.
  pub fn compensate<F, UserErr>(
    &mut self,
    step_name: &str,
    compensator_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<(), UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + 'static,
  {
    self.step_index(step_name);
    let compensator: Compensator<TData, Err> = Box::new(move |ctx_data| {
      let fut = compensator_fn(ctx_data);
      Box::pin(async move { fut.await.map_err(Into::into) })
    });
    self.compensators.insert(step_name.to_string(), compensator);
  }
}

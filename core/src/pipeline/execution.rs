// core/src/pipeline/execution.rs

//! `Pipeline::run` and the unwinding of completed steps.

use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::core::handler::Handler;
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, info_span, instrument, Instrument, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: Send + Sync + 'static,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step against `ctx_data`.
  ///
  /// A failing optional step is logged and skipped. A failing required step
  /// unwinds the steps completed so far (see [`Pipeline::compensate`]) and
  /// returns its error. A step whose handlers fail halfway is not considered
  /// completed, so its own compensator does not run.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(context_type = %std::any::type_name::<TData>(), num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    let mut completed: Vec<&str> = Vec::with_capacity(self.steps.len());

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();

      if let Some(skip_if) = &step_def.skip_if {
        if skip_if(&ctx_data) {
          event!(Level::DEBUG, step = step_name, "Step skipped by its skip condition.");
          continue;
        }
      }

      let handlers = match self.on.get(step_name) {
        Some(handlers) if !handlers.is_empty() => handlers,
        _ if step_def.optional => {
          event!(Level::DEBUG, step = step_name, "Optional step has no handler, skipping.");
          continue;
        }
        _ => {
          event!(Level::ERROR, step = step_name, "Required step has no handler.");
          self.unwind(&completed, &ctx_data).await;
          return Err(Err::from(FlowError::HandlerMissing {
            step_name: step_def.name.clone(),
          }));
        }
      };

      let span = info_span!("pipeline_step", step = step_name, index = step_idx, optional = step_def.optional);
      match run_handlers(handlers, &ctx_data).instrument(span).await {
        Ok(PipelineControl::Continue) => completed.push(step_name),
        Ok(PipelineControl::Stop) => {
          event!(Level::INFO, step = step_name, "Pipeline stopped by handler.");
          return Ok(PipelineResult::Stopped);
        }
        Err(e) if step_def.optional => {
          event!(Level::WARN, step = step_name, error = %e, "Optional step failed, continuing.");
        }
        Err(e) => {
          event!(Level::ERROR, step = step_name, error = %e, "Step failed.");
          self.unwind(&completed, &ctx_data).await;
          return Err(e);
        }
      }
    }

    event!(Level::DEBUG, "Pipeline completed.");
    Ok(PipelineResult::Completed)
  }

  async fn unwind(&self, completed: &[&str], ctx_data: &ContextData<TData>) {
    for step_name in completed.iter().rev() {
      let Some(compensator) = self.compensators.get(*step_name) else {
        continue;
      };
      event!(Level::INFO, step = *step_name, "Compensating completed step.");
      if let Err(e) = compensator(ctx_data.clone()).await {
        event!(Level::ERROR, step = *step_name, error = %e, "Compensation failed; leaving partial state behind.");
      }
    }
  }
}

async fn run_handlers<TData, Err>(
  handlers: &[Handler<TData, Err>],
  ctx_data: &ContextData<TData>,
) -> Result<PipelineControl, Err>
where
  TData: Send + Sync + 'static,
{
  for handler in handlers {
    if handler(ctx_data.clone()).await? == PipelineControl::Stop {
      return Ok(PipelineControl::Stop);
    }
  }
  Ok(PipelineControl::Continue)
}

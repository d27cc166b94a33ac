// core/src/core/control.rs

//! Signals returned by step handlers and the outcome of a whole run.

/// Returned by a step handler to say whether the run goes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  /// Run the remaining handlers of this step, then the next step.
  Continue,
  /// Halt the run here. Nothing after this handler executes and no
  /// compensation is triggered: stopping is a deliberate outcome, not a failure.
  Stop,
}

/// Outcome of a run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  Completed,
  Stopped,
}

impl PipelineResult {
  pub fn is_completed(self) -> bool {
    matches!(self, PipelineResult::Completed)
  }
}

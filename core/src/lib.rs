// core/src/lib.rs

//! Stepflow: a small asynchronous step pipeline.
//!
//! A pipeline is an ordered list of named steps run against a shared
//! [`ContextData`]. Each step has one or more async handlers that either
//! continue or stop the run. Steps may be optional (their failures are logged
//! and swallowed) or carry a skip condition.
//!
//! When a non-optional step fails, every step that already completed and has
//! a compensation handler is unwound in reverse order. Compensation is best
//! effort: a failing compensator is logged and the original error is still the
//! one returned to the caller.

pub mod core;
pub mod error;
pub mod pipeline;

pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::handler::{Compensator, Handler};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

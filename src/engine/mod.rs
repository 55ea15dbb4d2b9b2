//! Tier-gated, deterministic metric execution
//!
//! [`MetricExecutionService::execute`] is the only entry point. It validates a
//! [`MetricExecutionRequest`] against the metric's governed definition and either returns a
//! [`MetricExecutionResult`] or exactly one [`ExecutionError`].
//!
//! # Implementation Model
//!
//! Execution is a pure function of the registry and the request: no I/O, no shared mutable
//! state, no retries. The sequence is:
//!
//! 1. Reject a blank metric id or caller tier
//! 2. Look the metric up in the [`MetricRegistry`](crate::metrics::MetricRegistry)
//! 3. Require the caller's tier to rank at or above the metric's tier; unrecognized tiers rank
//!    below every real tier
//! 4. Resolve the request's time window against the metric's time semantics
//! 5. Dispatch to the [`FormulaStrategy`] selected by the metric's formula kind
//! 6. Keep only the request filters the metric supports
//!
//! Failures that indicate a broken definition (malformed formulas, ungoverned edge-case text,
//! absent thresholds) surface as [`ExecutionError::Internal`] rather than being skipped.

mod error;
mod request;
mod result;
mod service;
mod strategies;
mod time_context;

pub use error::{ErrorKind, ExecutionError};
pub use request::{ExecutionContext, MetricExecutionRequest, MetricInputs, Record};
pub use result::{MetricExecutionResult, TimeContext};
pub use service::MetricExecutionService;
pub use strategies::{
    AbcClassificationStrategy, ArithmeticStrategy, FormulaStrategy, MovementClassificationStrategy, round_to_precision, strategy_for,
};
pub use time_context::resolve_time_context;

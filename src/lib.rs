//! metric-engine crate
//!
//! Deterministic, tier-gated execution of governed business metrics. Metric definitions are
//! loaded once into an immutable [`MetricRegistry`](metrics::MetricRegistry); a
//! [`MetricExecutionService`](engine::MetricExecutionService) then authorizes each request
//! against the caller's tier, resolves its time window, applies supported dimension filters,
//! and computes the value with the strategy the definition's formula selects.
//!
//! The same engine backs governance validation: a definition's embedded test cases are run
//! through it before the definition is accepted.

/// Result type alias using `ohno::AppError` as the default error type.
pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[doc(hidden)]
pub mod commands;

pub mod config;
pub mod engine;
pub mod expr;
pub mod governance;
pub mod metrics;

pub use commands::{Host, run};

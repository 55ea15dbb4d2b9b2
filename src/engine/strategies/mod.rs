//! Formula strategies
//!
//! Every [`FormulaKind`] maps to exactly one [`FormulaStrategy`]. Arithmetic metrics share a
//! single strategy, so adding a new ratio or snapshot metric needs only a new definition.

mod abc;
mod arithmetic;
mod movement;

pub use abc::AbcClassificationStrategy;
pub use arithmetic::{ArithmeticStrategy, round_to_precision};
pub use movement::MovementClassificationStrategy;

use super::{ExecutionError, MetricInputs};
use crate::metrics::{FormulaKind, MetricDefinition, MetricValue};
use core::fmt::Debug;

/// Computes a metric's value once the request has been authorized and its time context resolved
pub trait FormulaStrategy: Debug + Send + Sync {
    /// # Errors
    ///
    /// Returns [`ExecutionError::MissingInputs`] when required inputs are absent, or
    /// [`ExecutionError::Internal`] when the definition is malformed.
    fn execute(&self, definition: &MetricDefinition, inputs: &MetricInputs) -> Result<MetricValue, ExecutionError>;
}

static ARITHMETIC: ArithmeticStrategy = ArithmeticStrategy;
static MOVEMENT: MovementClassificationStrategy = MovementClassificationStrategy;
static ABC: AbcClassificationStrategy = AbcClassificationStrategy;

/// The strategy that computes metrics with the given formula
#[must_use]
pub fn strategy_for(kind: &FormulaKind) -> &'static dyn FormulaStrategy {
    match kind {
        FormulaKind::Expression(_) => &ARITHMETIC,
        FormulaKind::MovementClassification => &MOVEMENT,
        FormulaKind::AbcClassification => &ABC,
    }
}

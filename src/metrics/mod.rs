//! Governed metric definitions and the registry that holds them
//!
//! A [`MetricDefinition`] is produced once by a loader (see `config`) and is never mutated at
//! runtime. Definitions are collected into a [`MetricRegistry`], which is the only state the
//! execution engine reads.
//!
//! # Implementation Model
//!
//! A definition names:
//! - **Tier**: the minimum [`Tier`] a caller must hold
//! - **Formula**: a [`FormulaKind`], either an arithmetic expression or one of the reserved
//!   classification strategies
//! - **Variables**: declared inputs, some of which are derived from other variables
//! - **Time semantics**: whether the metric is a point-in-time snapshot or a period aggregate
//! - **Edge cases**: ordered [`EdgeCase`] overrides checked before the primary formula
//! - **Thresholds and classification rules**: configuration for the classification strategies
//!
//! The computed result of a metric is a [`MetricValue`].

mod edge_case;
mod formula;
mod metric_def;
mod metric_value;
mod registry;
mod tier;

pub use edge_case::{CompiledEdgeCase, EdgeCase, EdgeCaseRule};
pub use formula::{ABC_CLASSIFICATION, FormulaKind, MOVEMENT_CLASSIFICATION};
pub use metric_def::{
    AS_OF_DATE, ClassificationRule, DERIVED_AGGREGATION, MetricDefinition, OutputSpec, PERIOD_END, PERIOD_START, TimeSemantics,
    TimeSemanticsType, VariableDefinition,
};
pub use metric_value::MetricValue;
pub use registry::MetricRegistry;
pub use tier::Tier;

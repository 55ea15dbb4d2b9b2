//! Deterministic arithmetic and comparison expressions
//!
//! This module has no knowledge of metrics. It evaluates arithmetic strings over a flat map of
//! named numeric variables, and builds boolean conditions out of comparisons between such
//! expressions.
//!
//! # Implementation Model
//!
//! An [`Expression`] is tokenized left to right, converted from infix to postfix with the
//! Shunting-Yard method (`+ -` bind looser than `* /`, both left-associative), and evaluated with
//! a single numeric stack. A `-` at the start of an expression, after another operator, or after
//! `(` is unary. It is a distinct negation operator that binds tighter than `* /` and associates
//! to the right, so `2 * -x` is `2 * (0 - x)`. It is not a synthesized `0` followed by an
//! ordinary binary `-`, which would read `2 * -x` as `(2 * 0) - x`.
//!
//! Expressions are compiled once and may be evaluated any number of times. Evaluation never
//! mutates the expression, so compiled expressions can be shared freely across threads.
//!
//! A [`Condition`] is one or more comparisons joined by `AND`. Both the edge-case overrides and
//! the movement classification rules of a metric definition are written in this grammar.
//!
//! Division is plain IEEE division: dividing by zero yields infinity or NaN rather than an error.

mod condition;
mod error;
mod evaluator;
mod token;

pub use condition::{Comparator, Comparison, Condition};
pub use error::EvalError;
pub use evaluator::{Expression, Variables, evaluate};

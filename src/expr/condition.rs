//! Boolean conditions built from arithmetic comparisons
//!
//! Grammar:
//!
//! ```text
//! condition  := comparison ( AND comparison )*
//! comparison := arith op arith
//! op         := ">=" | "<=" | "==" | "!=" | ">" | "<"
//! ```
//!
//! `AND` is matched case-insensitively, `&&` is accepted as a synonym. Each side of a
//! comparison is an arithmetic [`Expression`], so `averageDailyMovement >= fast_threshold`
//! and `QuantityMoved / DaysObserved < 0.5` are both valid.

use super::{EvalError, Expression, Variables};
use core::fmt;
use regex::Regex;
use std::sync::LazyLock;

static AND_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+and\s+|&&").expect("invalid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Equal,
    NotEqual,
}

impl Comparator {
    // Two-character operators come first so `>=` is never read as `>`.
    const ALL: [(&'static str, Self); 6] = [
        (">=", Self::GreaterOrEqual),
        ("<=", Self::LessOrEqual),
        ("==", Self::Equal),
        ("!=", Self::NotEqual),
        (">", Self::GreaterThan),
        ("<", Self::LessThan),
    ];

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::GreaterOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessOrEqual => "<=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
        }
    }

    #[expect(clippy::float_cmp, reason = "Conditions compare governed values exactly")]
    #[must_use]
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::GreaterThan => lhs > rhs,
            Self::GreaterOrEqual => lhs >= rhs,
            Self::LessThan => lhs < rhs,
            Self::LessOrEqual => lhs <= rhs,
            Self::Equal => lhs == rhs,
            Self::NotEqual => lhs != rhs,
        }
    }
}

/// A single `lhs <op> rhs` comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub lhs: Expression,
    pub comparator: Comparator,
    pub rhs: Expression,
}

impl Comparison {
    fn parse(condition: &str, text: &str) -> Result<Self, EvalError> {
        let found = text.char_indices().find_map(|(i, _)| {
            let rest = text.get(i..)?;
            Comparator::ALL
                .iter()
                .find(|(symbol, _)| rest.starts_with(symbol))
                .map(|(symbol, comparator)| (i, symbol.len(), *comparator))
        });

        let Some((at, len, comparator)) = found else {
            return Err(EvalError::syntax(condition, format!("no comparison operator in '{}'", text.trim())));
        };

        let lhs = text.get(..at).unwrap_or_default();
        let rhs = text.get(at + len..).unwrap_or_default();

        Ok(Self {
            lhs: Expression::parse(lhs.trim())?,
            comparator,
            rhs: Expression::parse(rhs.trim())?,
        })
    }

    /// # Errors
    ///
    /// Returns [`EvalError::MissingVariable`] if either side references an unknown identifier.
    pub fn evaluate(&self, variables: &Variables) -> Result<bool, EvalError> {
        let lhs = self.lhs.evaluate(variables)?;
        let rhs = self.rhs.evaluate(variables)?;
        Ok(self.comparator.holds(lhs, rhs))
    }
}

/// A conjunction of comparisons
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    text: String,
    comparisons: Vec<Comparison>,
}

impl Condition {
    /// # Errors
    ///
    /// Returns [`EvalError::Syntax`] if any clause lacks a comparison operator or has a malformed
    /// arithmetic side.
    pub fn parse(text: &str) -> Result<Self, EvalError> {
        if text.trim().is_empty() {
            return Err(EvalError::syntax(text, "empty condition"));
        }

        let comparisons = AND_REGEX
            .split(text)
            .map(|clause| Comparison::parse(text, clause))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            text: text.trim().to_string(),
            comparisons,
        })
    }

    /// Build the condition `variable == value`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Syntax`] if `variable` is not a valid identifier expression.
    pub fn equals(variable: &str, value: f64) -> Result<Self, EvalError> {
        Ok(Self {
            text: format!("{variable} == {value}"),
            comparisons: vec![Comparison {
                lhs: Expression::parse(variable)?,
                comparator: Comparator::Equal,
                rhs: Expression::parse(&value.to_string())?,
            }],
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn comparisons(&self) -> &[Comparison] {
        &self.comparisons
    }

    /// Identifiers referenced anywhere in the condition
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.comparisons
            .iter()
            .flat_map(|c| c.lhs.identifiers().chain(c.rhs.identifiers()))
    }

    /// True when every comparison holds. Stops at the first comparison that does not.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::MissingVariable`] if an evaluated comparison references an unknown
    /// identifier.
    pub fn evaluate(&self, variables: &Variables) -> Result<bool, EvalError> {
        for comparison in &self.comparisons {
            if !comparison.evaluate(variables)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

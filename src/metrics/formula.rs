use core::fmt;
use serde::{Deserialize, Serialize};

/// Reserved formula identifier selecting velocity-based movement classification
pub const MOVEMENT_CLASSIFICATION: &str = "MOVEMENT_CLASSIFICATION";

/// Reserved formula identifier selecting value-based ABC classification
pub const ABC_CLASSIFICATION: &str = "ABC_CLASSIFICATION";

/// How a metric computes its value
///
/// In definition files the formula is a plain string: one of the two reserved identifiers, or
/// any other text, which is taken as an arithmetic expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum FormulaKind {
    Expression(String),
    MovementClassification,
    AbcClassification,
}

impl From<String> for FormulaKind {
    fn from(value: String) -> Self {
        let reserved = match value.trim() {
            MOVEMENT_CLASSIFICATION => Some(Self::MovementClassification),
            ABC_CLASSIFICATION => Some(Self::AbcClassification),
            _ => None,
        };
        reserved.unwrap_or(Self::Expression(value))
    }
}

impl From<&str> for FormulaKind {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<FormulaKind> for String {
    fn from(value: FormulaKind) -> Self {
        match value {
            FormulaKind::Expression(text) => text,
            FormulaKind::MovementClassification => MOVEMENT_CLASSIFICATION.to_string(),
            FormulaKind::AbcClassification => ABC_CLASSIFICATION.to_string(),
        }
    }
}

impl fmt::Display for FormulaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression(text) => f.write_str(text),
            Self::MovementClassification => f.write_str(MOVEMENT_CLASSIFICATION),
            Self::AbcClassification => f.write_str(ABC_CLASSIFICATION),
        }
    }
}

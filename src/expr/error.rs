use thiserror::Error;

/// Failures raised while parsing or evaluating an expression
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// The expression text is malformed.
    #[error("invalid expression '{expression}': {reason}")]
    Syntax { expression: String, reason: String },

    /// A referenced variable is absent or is not a finite number.
    #[error("missing input '{0}'")]
    MissingVariable(String),
}

impl EvalError {
    pub(crate) fn syntax(expression: &str, reason: impl Into<String>) -> Self {
        Self::Syntax {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}

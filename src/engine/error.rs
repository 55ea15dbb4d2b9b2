use crate::metrics::Tier;
use serde::Serialize;
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Failure of a single metric execution
///
/// The first four variants are request-time failures the caller can act on. [`Internal`] means
/// the governed definition itself is broken: a malformed formula, edge case, or classification
/// rule, or a threshold a strategy needs but cannot find.
///
/// [`Internal`]: ExecutionError::Internal
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("metric '{metric_id}' not found")]
    MetricNotFound { metric_id: String },

    #[error(
        "tier '{requested}' is not authorized to execute metric '{metric_id}'{}",
        .required.map_or_else(String::new, |t| format!(" (requires {t})"))
    )]
    UnauthorizedTier {
        metric_id: String,
        requested: String,
        required: Option<Tier>,
    },

    #[error("invalid time context for metric '{metric_id}': {reason}")]
    InvalidTimeContext { metric_id: String, reason: String },

    #[error("missing required inputs for metric '{metric_id}': {}", .missing.join(", "))]
    MissingInputs { metric_id: String, missing: Vec<String> },

    #[error("metric '{metric_id}' is misconfigured: {error}")]
    Internal { metric_id: String, error: ohno::AppError },
}

/// The kind of an [`ExecutionError`], without its context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MetricNotFound,
    UnauthorizedTier,
    InvalidTimeContext,
    MissingInputs,
    Internal,
}

impl ExecutionError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MetricNotFound { .. } => ErrorKind::MetricNotFound,
            Self::UnauthorizedTier { .. } => ErrorKind::UnauthorizedTier,
            Self::InvalidTimeContext { .. } => ErrorKind::InvalidTimeContext,
            Self::MissingInputs { .. } => ErrorKind::MissingInputs,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    #[must_use]
    pub fn metric_id(&self) -> &str {
        match self {
            Self::MetricNotFound { metric_id }
            | Self::UnauthorizedTier { metric_id, .. }
            | Self::InvalidTimeContext { metric_id, .. }
            | Self::MissingInputs { metric_id, .. }
            | Self::Internal { metric_id, .. } => metric_id,
        }
    }

    pub(crate) fn internal(metric_id: &str, error: ohno::AppError) -> Self {
        Self::Internal {
            metric_id: metric_id.to_string(),
            error,
        }
    }

    pub(crate) fn missing(metric_id: &str, missing: Vec<String>) -> Self {
        Self::MissingInputs {
            metric_id: metric_id.to_string(),
            missing,
        }
    }

    pub(crate) fn time_context(metric_id: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTimeContext {
            metric_id: metric_id.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ohno::app_err;

    #[test]
    fn test_messages() {
        let err = ExecutionError::MetricNotFound {
            metric_id: "NOPE".into(),
        };
        insta::assert_snapshot!(err, @"metric 'NOPE' not found");

        let err = ExecutionError::UnauthorizedTier {
            metric_id: "INVENTORY_TURNOVER".into(),
            requested: "TIER_1".into(),
            required: Some(Tier::Tier2),
        };
        insta::assert_snapshot!(err, @"tier 'TIER_1' is not authorized to execute metric 'INVENTORY_TURNOVER' (requires TIER_2)");

        let err = ExecutionError::UnauthorizedTier {
            metric_id: "X".into(),
            requested: String::new(),
            required: None,
        };
        insta::assert_snapshot!(err, @"tier '' is not authorized to execute metric 'X'");

        let err = ExecutionError::missing("INVENTORY_TURNOVER", vec!["COGS".into(), "InventoryEnd".into()]);
        insta::assert_snapshot!(err, @"missing required inputs for metric 'INVENTORY_TURNOVER': COGS, InventoryEnd");

        let err = ExecutionError::time_context("X", "period_start is required");
        insta::assert_snapshot!(err, @"invalid time context for metric 'X': period_start is required");
    }

    #[test]
    fn test_kind() {
        assert_eq!(ExecutionError::missing("X", vec![]).kind(), ErrorKind::MissingInputs);
        assert_eq!(ExecutionError::internal("X", app_err!("broken")).kind(), ErrorKind::Internal);
        assert_eq!(ErrorKind::InvalidTimeContext.to_string(), "invalid_time_context");
        assert_eq!("unauthorized_tier".parse::<ErrorKind>().unwrap(), ErrorKind::UnauthorizedTier);
    }

    #[test]
    fn test_metric_id() {
        assert_eq!(ExecutionError::internal("ABC", app_err!("broken")).metric_id(), "ABC");
    }
}

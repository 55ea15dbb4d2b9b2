//! Governance validation of metric definition documents
//!
//! Before a definition is trusted by the engine it is checked against a [`GovernanceSchema`]:
//! required fields, allowed tiers, time semantics, test coverage, edge-case coverage, and an
//! audit trail. Its embedded test cases are then executed through the engine itself, so the
//! documented expectations and the computed values can never drift apart.
//!
//! Validation works on the raw document rather than a [`MetricDefinition`](crate::metrics::MetricDefinition),
//! since governance fields such as `tests` and `audit` have no meaning at execution time.

mod checks;
mod math;

pub use checks::{assumptions, check_document};
pub use math::{TOLERANCE, run_tests};

use crate::config::GovernanceSchema;
use serde_yaml::Value;

/// Outcome of validating one definition document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    /// Governance rules the document breaks
    pub errors: Vec<String>,

    /// Embedded test cases whose expectation the engine does not reproduce
    pub math_failures: Vec<String>,

    /// Data sourcing assumptions a reviewer should confirm, one per variable
    pub assumptions: Vec<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.errors.is_empty() && self.math_failures.is_empty()
    }
}

/// Check a definition document against a schema and run its test cases.
#[must_use]
pub fn validate(doc: &Value, schema: &GovernanceSchema) -> ValidationReport {
    ValidationReport {
        errors: check_document(doc, schema),
        math_failures: run_tests(doc),
        assumptions: assumptions(doc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_passes_only_without_errors_or_failures() {
        let mut report = ValidationReport::default();
        assert!(report.passed());

        report.assumptions.push("COGS: tables=None fields=None aggregation=SUM".into());
        assert!(report.passed());

        report.math_failures.push("t: expected 1, got 2".into());
        assert!(!report.passed());
    }

    #[test]
    fn test_validate_collects_all_sections() {
        let doc: Value = serde_yaml::from_str("metric_id: X\ntier: TIER_1\nvariables:\n  a:\n    aggregation: SUM\n").unwrap();
        let report = validate(&doc, &GovernanceSchema::load(None).unwrap());
        assert!(!report.passed());
        assert!(!report.errors.is_empty());
        assert!(report.math_failures.is_empty());
        assert_eq!(report.assumptions, vec!["a: tables=None fields=None aggregation=SUM"]);
    }
}

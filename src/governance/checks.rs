//! Structural checks of a raw definition document against a governance schema

use crate::config::{DivisionRule, GovernanceSchema};
use serde_yaml::Value;
use std::collections::BTreeSet;

const AUDIT_FIELDS: [&str; 3] = ["created_by", "approved_by", "approval_date"];

/// Every governance rule the document breaks, in rule order
#[must_use]
pub fn check_document(doc: &Value, schema: &GovernanceSchema) -> Vec<String> {
    let mut errors = Vec::new();

    check_required_fields(doc, schema, &mut errors);
    check_tier(doc, schema, &mut errors);
    check_time_semantics(doc, schema, &mut errors);
    check_tests(doc, schema, &mut errors);
    check_edge_cases(doc, schema, &mut errors);
    check_audit(doc, &mut errors);

    errors
}

/// One line per declared variable describing where its value is expected to come from
#[must_use]
pub fn assumptions(doc: &Value) -> Vec<String> {
    let Some(variables) = doc.get("variables").and_then(Value::as_mapping) else {
        return Vec::new();
    };

    variables
        .iter()
        .map(|(name, var)| {
            format!(
                "{}: tables={} fields={} aggregation={}",
                text(name),
                describe(var.get("source_tables")),
                describe(var.get("source_fields")),
                describe(var.get("aggregation")),
            )
        })
        .collect()
}

fn check_required_fields(doc: &Value, schema: &GovernanceSchema, errors: &mut Vec<String>) {
    for field in &schema.required_fields {
        if doc.get(field).is_none_or(is_blank) {
            errors.push(format!("Missing or empty required field: {field}"));
        }
    }
}

fn check_tier(doc: &Value, schema: &GovernanceSchema, errors: &mut Vec<String>) {
    let tier = doc.get("tier");
    let allowed = tier.and_then(Value::as_str).is_some_and(|t| schema.allowed_tiers.iter().any(|a| a == t));

    if !allowed {
        let sorted: BTreeSet<_> = schema.allowed_tiers.iter().collect();
        errors.push(format!("Invalid tier '{}'. Allowed: {sorted:?}", describe(tier)));
    }
}

fn check_time_semantics(doc: &Value, schema: &GovernanceSchema, errors: &mut Vec<String>) {
    let rules = &schema.time_semantics_rules;
    let semantics = doc.get("time_semantics");
    let kind = semantics.and_then(|ts| ts.get("type"));

    let kind_str = kind.and_then(Value::as_str);
    if !kind_str.is_some_and(|k| rules.allowed_types.iter().any(|a| a == k)) {
        errors.push(format!("Invalid time_semantics.type '{}'", describe(kind)));
    }

    let empty = Value::Sequence(Vec::new());
    let dates = semantics.and_then(|ts| ts.get("required_dates")).unwrap_or(&empty);

    let expected = kind_str
        .and_then(|k| rules.required_dates_by_type.get(k))
        .filter(|expected| !expected.is_empty());

    match (expected, dates.as_sequence()) {
        (Some(_), None) => errors.push("time_semantics.required_dates must be a list".to_string()),
        (Some(expected), Some(dates)) => {
            let expected_set: BTreeSet<&str> = expected.iter().map(String::as_str).collect();
            let actual_set: BTreeSet<&str> = dates.iter().filter_map(Value::as_str).collect();
            if actual_set != expected_set || dates.len() != expected.len() {
                errors.push(format!("time_semantics.required_dates must match {expected_set:?}"));
            }
        }
        (None, dates) => {
            if dates.is_none_or(|d| d.len() < 2) {
                errors.push("time_semantics.required_dates must include start and end".to_string());
            }
        }
    }
}

fn check_tests(doc: &Value, schema: &GovernanceSchema, errors: &mut Vec<String>) {
    let minimum = schema.test_rules.minimum_test_cases;

    let tests = match doc.get("tests") {
        None => Some(&[][..]),
        Some(value) => value.as_sequence().map(Vec::as_slice),
    };

    match tests {
        Some(tests) if tests.len() >= minimum => {
            for test in tests {
                if test.get("expected_output").is_none() && test.get("expected_error").is_none() {
                    errors.push(format!("Test missing expected_output: {}", test_name(test)));
                }
            }
        }
        _ => errors.push(format!(
            "Insufficient tests (found {}, require {minimum})",
            tests.map_or(0, <[Value]>::len)
        )),
    }
}

fn check_edge_cases(doc: &Value, schema: &GovernanceSchema, errors: &mut Vec<String>) {
    let rules = &schema.edge_case_rules;

    let edge_cases = match doc.get("edge_cases") {
        None => Some(&[][..]),
        Some(value) => value.as_sequence().map(Vec::as_slice),
    };

    if edge_cases.is_none_or(|e| e.len() < rules.minimum_count) {
        errors.push("Insufficient edge_cases".to_string());
    }

    let require_division_handling = match rules.require_division_by_zero_handling {
        DivisionRule::Never => false,
        DivisionRule::Always => true,
        DivisionRule::WhenMathOperationsIncludeDivision => doc
            .get("math_operations")
            .and_then(Value::as_sequence)
            .is_some_and(|ops| ops.iter().any(|op| text(op).trim().eq_ignore_ascii_case("division"))),
    };

    if require_division_handling {
        let edge_text = edge_cases
            .unwrap_or_default()
            .iter()
            .map(edge_case_text)
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        if !edge_text.contains("zero") && !edge_text.contains("division") {
            errors.push("edge_cases must explicitly mention division-by-zero handling".to_string());
        }
    }
}

fn check_audit(doc: &Value, errors: &mut Vec<String>) {
    let audit = doc.get("audit");

    for field in AUDIT_FIELDS {
        let value = audit.and_then(|a| a.get(field));
        if value.is_none_or(|v| v.is_null() || v.as_str().is_some_and(str::is_empty)) {
            errors.push(format!("Missing or empty audit.{field}"));
        }
    }
}

pub(super) fn test_name(test: &Value) -> String {
    test.get("name").map_or_else(|| "<unnamed>".to_string(), text)
}

/// An edge case flattened to text: prose as is, a mapping as `key value` pairs
fn edge_case_text(edge_case: &Value) -> String {
    match edge_case {
        Value::Mapping(map) => map
            .iter()
            .map(|(k, v)| format!("{} {}", text(k), text(v)))
            .collect::<Vec<_>>()
            .join(" "),
        other => text(other),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Sequence(s) => s.is_empty(),
        Value::Mapping(m) => m.is_empty(),
        _ => false,
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(items) => format!("[{}]", items.iter().map(text).collect::<Vec<_>>().join(", ")),
        Value::Mapping(_) | Value::Tagged(_) => serde_yaml::to_string(value).map_or_else(|_| String::new(), |s| s.trim().to_string()),
    }
}

fn describe(value: Option<&Value>) -> String {
    value.map_or_else(|| "None".to_string(), text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETE: &str = r"
metric_id: INVENTORY_TURNOVER
description: How many times inventory turns over in a period
tier: TIER_2
formula: COGS / AverageInventory
math_operations: [Division, addition]
variables:
  COGS:
    source_tables: [ledger_entries]
    source_fields: amount
    aggregation: SUM
  AverageInventory:
    aggregation: DERIVED
    expression: (InventoryBegin + InventoryEnd) / 2
time_semantics:
  type: period
  required_dates: [period_end, period_start]
edge_cases:
  - when: AverageInventory == 0
    result: null
    description: avoid division by zero
tests:
  - name: normal
    expected_output: 4
  - name: empty inventory
    expected_output: null
audit:
  created_by: analyst
  approved_by: controller
  approval_date: 2024-01-15
";

    fn doc(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn schema() -> GovernanceSchema {
        GovernanceSchema::load(None).unwrap()
    }

    fn errors_after(edit: impl FnOnce(&mut Value)) -> Vec<String> {
        let mut d = doc(COMPLETE);
        edit(&mut d);
        check_document(&d, &schema())
    }

    #[test]
    fn test_complete_document_passes() {
        assert_eq!(check_document(&doc(COMPLETE), &schema()), Vec::<String>::new());
    }

    #[test]
    fn test_required_field_blank() {
        let errors = errors_after(|d| d["description"] = Value::String(String::new()));
        assert_eq!(errors, vec!["Missing or empty required field: description"]);
    }

    #[test]
    fn test_invalid_tier() {
        let errors = errors_after(|d| d["tier"] = Value::String("TIER_9".into()));
        insta::assert_snapshot!(errors.join("\n"), @r#"Invalid tier 'TIER_9'. Allowed: {"TIER_1", "TIER_2", "TIER_3"}"#);
    }

    #[test]
    fn test_time_semantics_dates_must_match_type() {
        let errors = errors_after(|d| d["time_semantics"]["required_dates"] = doc("[as_of_date]"));
        insta::assert_snapshot!(errors.join("\n"), @r#"time_semantics.required_dates must match {"period_end", "period_start"}"#);

        let errors = errors_after(|d| d["time_semantics"]["type"] = Value::String("rolling".into()));
        assert_eq!(errors, vec!["Invalid time_semantics.type 'rolling'"]);

        let errors = errors_after(|d| {
            d["time_semantics"]["type"] = Value::String("rolling".into());
            d["time_semantics"]["required_dates"] = doc("[as_of_date]");
        });
        assert_eq!(
            errors,
            vec![
                "Invalid time_semantics.type 'rolling'",
                "time_semantics.required_dates must include start and end"
            ]
        );
    }

    #[test]
    fn test_insufficient_tests() {
        let errors = errors_after(|d| d["tests"] = doc("[{name: only, expected_output: 1}]"));
        assert_eq!(errors, vec!["Insufficient tests (found 1, require 2)"]);
    }

    #[test]
    fn test_test_without_expectation() {
        let errors = errors_after(|d| d["tests"] = doc("[{name: a, expected_output: 1}, {name: b}, {expected_error: missing_inputs}]"));
        assert_eq!(errors, vec!["Test missing expected_output: b"]);
    }

    #[test]
    fn test_division_handling_required() {
        let errors = errors_after(|d| d["edge_cases"] = doc("- if `COGS` equals `5`, return `1`\n"));
        assert_eq!(errors, vec!["edge_cases must explicitly mention division-by-zero handling"]);

        let errors = errors_after(|d| {
            d["edge_cases"] = doc("- if `COGS` equals `5`, return `1`\n");
            d["math_operations"] = doc("[addition]");
        });
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_no_edge_cases() {
        let errors = errors_after(|d| d["edge_cases"] = doc("[]"));
        assert_eq!(
            errors,
            vec![
                "Missing or empty required field: edge_cases",
                "Insufficient edge_cases",
                "edge_cases must explicitly mention division-by-zero handling"
            ]
        );
    }

    #[test]
    fn test_audit_fields() {
        let errors = errors_after(|d| d["audit"]["approved_by"] = Value::String(String::new()));
        assert_eq!(errors, vec!["Missing or empty audit.approved_by"]);
    }

    #[test]
    fn test_assumptions() {
        insta::assert_snapshot!(assumptions(&doc(COMPLETE)).join("\n"), @r"
        COGS: tables=[ledger_entries] fields=amount aggregation=SUM
        AverageInventory: tables=None fields=None aggregation=DERIVED
        ");
    }

    #[test]
    fn test_empty_document() {
        let errors = check_document(&Value::Null, &schema());
        assert!(errors.iter().any(|e| e == "Missing or empty required field: metric_id"));
        assert!(errors.iter().any(|e| e == "Missing or empty audit.created_by"));
    }
}

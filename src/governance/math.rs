//! Running a definition's embedded test cases through the engine

use super::checks::test_name;
use crate::engine::{ErrorKind, ExecutionContext, MetricExecutionRequest, MetricExecutionService, MetricInputs};
use crate::metrics::{MetricDefinition, MetricRegistry, MetricValue, PERIOD_END, Tier};
use serde_json::Value as JsonValue;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

const LOG_TARGET: &str = "governance";

/// Numeric expectations pass when the computed value is this close
pub const TOLERANCE: f64 = 0.01;

const SYNTHETIC_START: &str = "2024-01-01";
const SYNTHETIC_END: &str = "2024-12-31";

/// Execute every test case in the document and describe each one that fails.
///
/// Each test runs at the highest tier with a synthetic time window, unless the test supplies its
/// own `tier` or `context`.
#[must_use]
pub fn run_tests(doc: &Value) -> Vec<String> {
    let Some(tests) = doc.get("tests").and_then(Value::as_sequence) else {
        return Vec::new();
    };

    if tests.is_empty() {
        return Vec::new();
    }

    let definition: MetricDefinition = match serde_yaml::from_value(doc.clone()) {
        Ok(definition) => definition,
        Err(e) => return vec![format!("definition cannot be executed: {e}")],
    };

    let metric_id = definition.metric_id.clone();
    let context = synthetic_context(&definition);

    let registry = match MetricRegistry::new([definition]) {
        Ok(registry) => registry,
        Err(e) => return vec![format!("definition cannot be registered: {e}")],
    };

    let service = MetricExecutionService::new(Arc::new(registry));

    tests
        .iter()
        .filter_map(|test| run_test(&service, &metric_id, &context, test).err())
        .collect()
}

fn run_test(service: &MetricExecutionService, metric_id: &str, context: &ExecutionContext, test: &Value) -> Result<(), String> {
    let name = test_name(test);

    let inputs: MetricInputs = match test.get("inputs") {
        None | Some(Value::Null) => MetricInputs::default(),
        Some(inputs) => serde_yaml::from_value(inputs.clone()).map_err(|e| format!("{name}: unusable inputs: {e}"))?,
    };

    let context = match test.get("context") {
        None | Some(Value::Null) => context.clone(),
        Some(ctx) => serde_yaml::from_value(ctx.clone()).map_err(|e| format!("{name}: unusable context: {e}"))?,
    };

    let tier = test
        .get("tier")
        .and_then(Value::as_str)
        .map_or_else(|| Tier::highest().to_string(), str::to_string);

    let request = MetricExecutionRequest {
        metric_id: metric_id.to_string(),
        requesting_user_tier: tier,
        context,
        inputs,
    };

    let outcome = service.execute(&request);
    log::debug!(target: LOG_TARGET, "Test '{name}' produced {outcome:?}");

    if let Some(expected_error) = test.get("expected_error") {
        let expected_kind = expected_error
            .as_str()
            .and_then(|s| s.parse::<ErrorKind>().ok())
            .ok_or_else(|| format!("{name}: expected_error must name an error kind"))?;

        return match outcome {
            Err(e) if e.kind() == expected_kind => Ok(()),
            Err(e) => Err(format!("{name}: expected {expected_kind}, got {}: {e}", e.kind())),
            Ok(result) => Err(format!("{name}: expected {expected_kind}, got {}", result.value)),
        };
    }

    let expected = test.get("expected_output").unwrap_or(&Value::Null);
    match outcome {
        Ok(result) => compare(expected, &result.value).map_err(|reason| format!("{name}: {reason}")),
        Err(e) => Err(format!("{name}: expected {}, got {}: {e}", describe(expected), e.kind())),
    }
}

fn compare(expected: &Value, actual: &MetricValue) -> Result<(), String> {
    let matches = match expected {
        Value::Null => actual.is_null(),
        Value::Number(n) => n
            .as_f64()
            .zip(actual.as_number())
            .is_some_and(|(e, a)| (e - a).abs() <= TOLERANCE),
        Value::String(s) => actual.as_text() == Some(s.as_str()),
        Value::Mapping(_) => {
            let expected: Option<BTreeMap<String, String>> = serde_yaml::from_value(expected.clone()).ok();
            expected.as_ref() == actual.as_classes()
        }
        _ => return Err(format!("unsupported expected_output {}", describe(expected))),
    };

    if matches {
        Ok(())
    } else {
        Err(format!("expected {}, got {actual}", describe(expected)))
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        other => serde_json::to_value(other).map_or_else(|_| String::new(), |v| match v {
            JsonValue::String(s) => s,
            v => v.to_string(),
        }),
    }
}

fn synthetic_context(definition: &MetricDefinition) -> ExecutionContext {
    let mut context = ExecutionContext::default();

    let names = definition
        .time_semantics
        .kind
        .canonical_dates()
        .iter()
        .copied()
        .chain(definition.time_semantics.required_dates.iter().map(String::as_str));

    for name in names {
        let value = if name == PERIOD_END { SYNTHETIC_END } else { SYNTHETIC_START };
        let _ = context.dates.insert(name.to_string(), JsonValue::String(value.to_string()));
    }

    context
}

#[cfg(test)]
mod tests {
    use super::*;

    const TURNOVER: &str = r"
metric_id: INVENTORY_TURNOVER
tier: TIER_2
formula: COGS / AverageInventory
variables:
  COGS:
    aggregation: SUM
  InventoryBegin:
    aggregation: SNAPSHOT
  InventoryEnd:
    aggregation: SNAPSHOT
  AverageInventory:
    description: Calculated as `(InventoryBegin + InventoryEnd) / 2`.
    aggregation: DERIVED
time_semantics:
  type: period
  required_dates: [period_start, period_end]
edge_cases:
  - if `AverageInventory` equals `0`, return `null`
  - if `COGS` equals `0`, return `0`
tests:
  - name: normal turnover
    inputs: { COGS: 1000, InventoryBegin: 100, InventoryEnd: 200 }
    expected_output: 6.666
  - name: empty inventory
    inputs: { COGS: 1000, InventoryBegin: 0, InventoryEnd: 0 }
    expected_output: null
  - name: no sales
    inputs: { COGS: 0, InventoryBegin: 10, InventoryEnd: 20 }
    expected_output: 0
  - name: missing cogs
    inputs: { InventoryBegin: 10, InventoryEnd: 20 }
    expected_error: missing_inputs
  - name: low tier
    tier: TIER_1
    inputs: { COGS: 1, InventoryBegin: 1, InventoryEnd: 1 }
    expected_error: unauthorized_tier
";

    fn doc(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_all_pass() {
        assert_eq!(run_tests(&doc(TURNOVER)), Vec::<String>::new());
    }

    #[test]
    fn test_failures_are_described() {
        let mut d = doc(TURNOVER);
        d["tests"] = doc(r"
- name: wrong number
  inputs: { COGS: 1000, InventoryBegin: 100, InventoryEnd: 200 }
  expected_output: 7
- name: expected null
  inputs: { COGS: 1000, InventoryBegin: 100, InventoryEnd: 300 }
  expected_output: null
- name: unexpected error
  inputs: { COGS: 1000 }
  expected_output: 1
- name: wrong error
  inputs: { COGS: 1, InventoryBegin: 1, InventoryEnd: 1 }
  expected_error: missing_inputs
");

        insta::assert_snapshot!(run_tests(&d).join("\n"), @r"
        wrong number: expected 7, got 6.67
        expected null: expected NULL, got 5
        unexpected error: expected 1, got missing_inputs: missing required inputs for metric 'INVENTORY_TURNOVER': AverageInventory, InventoryBegin, InventoryEnd
        wrong error: expected missing_inputs, got 1
        ");
    }

    #[test]
    fn test_classification_expectations() {
        let yaml = r"
metric_id: MOVEMENT_CLASS
tier: TIER_1
formula: MOVEMENT_CLASSIFICATION
time_semantics:
  type: point_in_time
  required_dates: [as_of_date]
thresholds:
  fast_threshold: 1.0
classification_rules:
  - name: fast
    condition: averageDailyMovement >= fast_threshold
tests:
  - name: fast mover
    inputs: { QuantityMoved: 30, DaysObserved: 30 }
    expected_output: FAST
  - name: dead
    inputs: { QuantityMoved: 0, DaysObserved: 30 }
    expected_output: DEAD
";
        assert!(run_tests(&doc(yaml)).is_empty());
    }

    #[test]
    fn test_abc_expectations() {
        let yaml = r"
metric_id: ABC_CLASS
tier: TIER_2
formula: ABC_CLASSIFICATION
time_semantics:
  type: period
classification_rules:
  - name: A
    max_cumulative_percent: 80
  - name: C
    max_cumulative_percent: 100
tests:
  - name: ranking
    inputs:
      - { item: widget, AnnualUsageQuantity: 100, UnitCost: 8 }
      - { item: bolt, AnnualUsageQuantity: 100, UnitCost: 2 }
    expected_output: { widget: A, bolt: B }
";
        assert!(run_tests(&doc(yaml)).is_empty(), "{:?}", run_tests(&doc(yaml)));
    }

    #[test]
    fn test_unexecutable_definition() {
        let failures = run_tests(&doc("metric_id: X\ntests:\n  - name: t\n    expected_output: 1\n"));
        assert_eq!(failures.len(), 1);
        assert!(failures[0].starts_with("definition cannot be executed"), "{failures:?}");
    }

    #[test]
    fn test_no_tests() {
        assert!(run_tests(&doc("metric_id: X\n")).is_empty());
    }

    #[test]
    fn test_synthetic_context_satisfies_semantics() {
        let def: MetricDefinition = serde_yaml::from_str(
            "metric_id: X\ntier: TIER_1\nformula: a\ntime_semantics:\n  type: period\n  required_dates: [period_start, period_end, close_date]\n",
        )
        .unwrap();
        let ctx = synthetic_context(&def);
        assert_eq!(ctx.date("period_start"), Some(SYNTHETIC_START));
        assert_eq!(ctx.date("period_end"), Some(SYNTHETIC_END));
        assert_eq!(ctx.date("close_date"), Some(SYNTHETIC_START));
    }
}

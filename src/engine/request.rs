use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A JSON record, as used by classification metrics that take arrays of items
pub type Record = Map<String, Value>;

/// A request to execute one metric
///
/// `requesting_user_tier` must come from a trusted identity resolved by the caller, never from
/// client input.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct MetricExecutionRequest {
    pub metric_id: String,

    pub requesting_user_tier: String,

    #[serde(default)]
    pub context: ExecutionContext,

    #[serde(default)]
    pub inputs: MetricInputs,
}

impl MetricExecutionRequest {
    #[must_use]
    pub fn new(metric_id: impl Into<String>, requesting_user_tier: impl Into<String>) -> Self {
        Self {
            metric_id: metric_id.into(),
            requesting_user_tier: requesting_user_tier.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_date(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.context.dates.insert(name.into(), Value::String(value.into()));
        self
    }

    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let _ = self.context.filters.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_inputs(mut self, inputs: MetricInputs) -> Self {
        self.inputs = inputs;
        self
    }
}

/// Time window fields plus optional dimension filters
///
/// Time fields sit at the top level of the context object (`as_of_date`, `period_start`,
/// `period_end`, or any other name a metric requires); filters are nested under `filters`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ExecutionContext {
    /// Dimension filters. Values may be any JSON scalar; they are echoed back as text.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, Value>,

    #[serde(flatten)]
    pub dates: BTreeMap<String, Value>,
}

impl ExecutionContext {
    /// A time field's value, if present as a non-blank string
    #[must_use]
    pub fn date(&self, name: &str) -> Option<&str> {
        self.dates
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Numeric inputs for a metric
///
/// Either a flat map of named values or, for ranking metrics, an array of records.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MetricInputs {
    Records(Vec<Record>),
    Values(Map<String, Value>),
}

impl Default for MetricInputs {
    fn default() -> Self {
        Self::Values(Map::new())
    }
}

impl MetricInputs {
    /// Build a value map from name/number pairs.
    pub fn values<K: Into<String>>(pairs: impl IntoIterator<Item = (K, f64)>) -> Self {
        Self::Values(pairs.into_iter().map(|(k, v)| (k.into(), Value::from(v))).collect())
    }

    /// A named input, if supplied as a finite number
    #[must_use]
    pub fn number(&self, name: &str) -> Option<f64> {
        match self {
            Self::Values(values) => values.get(name).and_then(Value::as_f64).filter(|v| v.is_finite()),
            Self::Records(_) => None,
        }
    }

    #[must_use]
    pub fn records(&self) -> Option<&[Record]> {
        match self {
            Self::Records(records) => Some(records),
            Self::Values(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_request() {
        let json = r#"{
            "metric_id": "INVENTORY_TURNOVER",
            "requesting_user_tier": "TIER_2",
            "context": {
                "period_start": "2024-01-01",
                "period_end": "2024-03-31",
                "filters": { "location": "DC-1", "color": "red" }
            },
            "inputs": { "COGS": 1000, "InventoryBegin": 150.5 }
        }"#;

        let request: MetricExecutionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.context.date("period_start"), Some("2024-01-01"));
        assert_eq!(request.context.filters.len(), 2);
        assert!(!request.context.dates.contains_key("filters"));
        assert_eq!(request.context.filters["location"], "DC-1");
        assert_eq!(request.inputs.number("COGS"), Some(1000.0));
        assert_eq!(request.inputs.number("InventoryBegin"), Some(150.5));
        assert_eq!(request.inputs.number("InventoryEnd"), None);
    }

    #[test]
    fn test_records_inputs() {
        let inputs: MetricInputs =
            serde_json::from_str(r#"[{ "item": "bolt", "AnnualUsageQuantity": 10, "UnitCost": 2.5 }]"#).unwrap();
        assert_eq!(inputs.records().map(<[Record]>::len), Some(1));
        assert_eq!(inputs.number("item"), None);
    }

    #[test]
    fn test_only_finite_numbers_resolve() {
        let inputs: MetricInputs = serde_json::from_str(r#"{ "a": "12", "b": null, "c": true, "d": 3 }"#).unwrap();
        assert_eq!(inputs.number("a"), None);
        assert_eq!(inputs.number("b"), None);
        assert_eq!(inputs.number("c"), None);
        assert_eq!(inputs.number("d"), Some(3.0));

        let inputs = MetricInputs::values([("x", f64::NAN), ("y", 1.0)]);
        assert_eq!(inputs.number("x"), None);
        assert_eq!(inputs.number("y"), Some(1.0));
    }

    #[test]
    fn test_blank_date_is_absent() {
        let request = MetricExecutionRequest::new("X", "TIER_1")
            .with_date("as_of_date", "   ")
            .with_date("period_start", " 2024-01-01 ");
        assert_eq!(request.context.date("as_of_date"), None);
        assert_eq!(request.context.date("period_start"), Some("2024-01-01"));
        assert_eq!(request.context.date("period_end"), None);
    }

    #[test]
    fn test_missing_context_and_inputs_default() {
        let request: MetricExecutionRequest =
            serde_json::from_str(r#"{ "metric_id": "X", "requesting_user_tier": "TIER_1" }"#).unwrap();
        assert!(request.context.dates.is_empty());
        assert_eq!(request.inputs, MetricInputs::default());
    }
}

use super::{EdgeCase, FormulaKind, Tier};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Aggregation mode marking a variable whose value is computed from other variables
pub const DERIVED_AGGREGATION: &str = "DERIVED";

/// Context field holding the snapshot date of a point-in-time metric
pub const AS_OF_DATE: &str = "as_of_date";

/// Context field holding the first day of a period-based metric's window
pub const PERIOD_START: &str = "period_start";

/// Context field holding the last day of a period-based metric's window
pub const PERIOD_END: &str = "period_end";

static CALCULATED_AS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)calculated\s+as\s+`([^`]+)`").expect("invalid regex"));

/// A governed metric definition
///
/// Produced once by a loader and never mutated afterwards. Fields the engine does not use
/// (ownership, audit trail, embedded test cases) are tolerated and ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricDefinition {
    pub metric_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub tier: Tier,

    pub formula: FormulaKind,

    #[serde(default)]
    pub variables: BTreeMap<String, VariableDefinition>,

    pub time_semantics: TimeSemantics,

    /// Filter keys this metric accepts; any other filter is dropped
    #[serde(default)]
    pub dimensions_supported: Vec<String>,

    /// Overrides checked in order before the primary formula
    #[serde(default)]
    pub edge_cases: Vec<EdgeCase>,

    #[serde(default)]
    pub thresholds: BTreeMap<String, f64>,

    #[serde(default)]
    pub classification_rules: Vec<ClassificationRule>,

    #[serde(default)]
    pub output: OutputSpec,
}

impl MetricDefinition {
    #[must_use]
    pub fn supports_dimension(&self, key: &str) -> bool {
        self.dimensions_supported.iter().any(|d| d == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct VariableDefinition {
    #[serde(default)]
    pub description: String,

    #[serde(default, deserialize_with = "one_or_many")]
    pub source_tables: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub source_fields: Vec<String>,

    #[serde(default)]
    pub aggregation: Option<String>,

    /// Formula for a `DERIVED` variable, evaluated against the other resolved variables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl VariableDefinition {
    #[must_use]
    pub fn is_derived(&self) -> bool {
        self.aggregation
            .as_deref()
            .is_some_and(|a| a.trim().eq_ignore_ascii_case(DERIVED_AGGREGATION))
    }

    /// The expression computing a derived variable.
    ///
    /// Prefers the structured `expression` field. Older definitions put the formula in the
    /// description as ``Calculated as `<expr>`.``, which is still honored.
    #[must_use]
    pub fn derived_expression(&self) -> Option<Cow<'_, str>> {
        if !self.is_derived() {
            return None;
        }

        if let Some(expr) = &self.expression {
            return Some(Cow::Borrowed(expr.as_str()));
        }

        CALCULATED_AS_REGEX
            .captures(&self.description)
            .and_then(|caps| caps.get(1))
            .map(|m| Cow::Owned(m.as_str().trim().to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimeSemanticsType {
    /// A single instantaneous snapshot, identified by an as-of date
    PointInTime,

    /// An aggregate over a date range, identified by start and end dates
    Period,
}

impl TimeSemanticsType {
    /// The context fields this type of time semantics is resolved from
    #[must_use]
    pub const fn canonical_dates(self) -> &'static [&'static str] {
        match self {
            Self::PointInTime => &[AS_OF_DATE],
            Self::Period => &[PERIOD_START, PERIOD_END],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TimeSemantics {
    #[serde(rename = "type")]
    pub kind: TimeSemanticsType,

    #[serde(default)]
    pub required_dates: Vec<String>,
}

/// A named classification rule
///
/// Movement classification uses `condition`; ABC classification uses `max_cumulative_percent`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassificationRule {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cumulative_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSpec {
    #[serde(default = "default_data_type")]
    pub data_type: String,

    #[serde(default = "default_precision")]
    pub precision: u32,

    #[serde(default)]
    pub unit: String,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            data_type: default_data_type(),
            precision: default_precision(),
            unit: String::new(),
        }
    }
}

fn default_data_type() -> String {
    "number".to_string()
}

const fn default_precision() -> u32 {
    2
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

use crate::metrics::MetricValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The outcome of a successful metric execution
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricExecutionResult {
    pub metric_id: String,
    pub value: MetricValue,
    pub unit: String,
    pub precision: u32,
    pub time_context: TimeContext,

    /// The request's filters whose keys the metric supports
    pub dimensions_applied: BTreeMap<String, String>,
}

/// A resolved time window
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimeContext {
    PointInTime { as_of_date: String },
    Period { period_start: String, period_end: String },
}

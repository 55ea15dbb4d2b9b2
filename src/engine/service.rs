use super::strategies::strategy_for;
use super::time_context::resolve_time_context;
use super::{ExecutionError, MetricExecutionRequest, MetricExecutionResult};
use crate::metrics::{MetricDefinition, MetricRegistry};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

const LOG_TARGET: &str = "    engine";

/// The single entry point for executing governed metrics
///
/// Holds nothing but a shared, read-only registry. Cloning is cheap, and `execute` may be called
/// concurrently from any number of threads.
#[derive(Debug, Clone)]
pub struct MetricExecutionService {
    registry: Arc<MetricRegistry>,
}

impl MetricExecutionService {
    #[must_use]
    pub const fn new(registry: Arc<MetricRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// Execute one metric.
    ///
    /// Checks run in a fixed order and the first failure is returned: metric id, caller tier,
    /// registry lookup, tier authorization, time context, and finally the formula itself.
    ///
    /// # Errors
    ///
    /// Returns exactly one [`ExecutionError`] describing the first check that failed.
    pub fn execute(&self, request: &MetricExecutionRequest) -> Result<MetricExecutionResult, ExecutionError> {
        let metric_id = request.metric_id.trim();
        if metric_id.is_empty() {
            return Err(ExecutionError::MetricNotFound {
                metric_id: request.metric_id.clone(),
            });
        }

        let requested = request.requesting_user_tier.trim();
        if requested.is_empty() {
            return Err(ExecutionError::UnauthorizedTier {
                metric_id: metric_id.to_string(),
                requested: request.requesting_user_tier.clone(),
                required: None,
            });
        }

        let Some(definition) = self.registry.get(metric_id) else {
            return Err(ExecutionError::MetricNotFound {
                metric_id: metric_id.to_string(),
            });
        };

        if !definition.tier.admits(requested) {
            return Err(ExecutionError::UnauthorizedTier {
                metric_id: metric_id.to_string(),
                requested: requested.to_string(),
                required: Some(definition.tier),
            });
        }

        let time_context = resolve_time_context(definition, &request.context)?;

        log::debug!(target: LOG_TARGET, "Executing {metric_id} with formula '{}'", definition.formula);
        let value = strategy_for(&definition.formula).execute(definition, &request.inputs)?;

        Ok(MetricExecutionResult {
            metric_id: definition.metric_id.clone(),
            value,
            unit: definition.output.unit.clone(),
            precision: definition.output.precision,
            time_context,
            dimensions_applied: applied_dimensions(definition, &request.context.filters),
        })
    }
}

/// Filters whose keys the metric supports, values as text. Any other filter is dropped without failing.
fn applied_dimensions(definition: &MetricDefinition, filters: &BTreeMap<String, Value>) -> BTreeMap<String, String> {
    let (applied, dropped): (BTreeMap<_, _>, BTreeMap<_, _>) = filters
        .iter()
        .map(|(k, v)| (k.clone(), filter_text(v)))
        .partition(|(k, _)| definition.supports_dimension(k));

    if !dropped.is_empty() {
        log::debug!(
            target: LOG_TARGET,
            "{}: ignoring unsupported filter(s) {}",
            definition.metric_id,
            dropped.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
        );
    }

    applied
}

fn filter_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

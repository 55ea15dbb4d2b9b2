use super::FormulaStrategy;
use crate::engine::{ExecutionError, MetricInputs};
use crate::expr::{Condition, Variables};
use crate::metrics::{MetricDefinition, MetricValue};
use ohno::app_err;

const LOG_TARGET: &str = "  movement";

pub const QUANTITY_MOVED: &str = "QuantityMoved";
pub const DAYS_OBSERVED: &str = "DaysObserved";
pub const AVERAGE_DAILY_MOVEMENT: &str = "averageDailyMovement";

pub const UNKNOWN: &str = "UNKNOWN";
pub const DEAD: &str = "DEAD";

/// Classifies an item by how fast its stock moves
///
/// No observed days means the rate is unknown; no movement means the item is dead stock.
/// Otherwise the average daily movement is checked against the metric's classification rules
/// in declaration order, and the first rule that holds names the class.
#[derive(Debug, Clone, Copy, Default)]
pub struct MovementClassificationStrategy;

impl FormulaStrategy for MovementClassificationStrategy {
    fn execute(&self, definition: &MetricDefinition, inputs: &MetricInputs) -> Result<MetricValue, ExecutionError> {
        let metric_id = definition.metric_id.as_str();

        let (Some(quantity), Some(days)) = (inputs.number(QUANTITY_MOVED), inputs.number(DAYS_OBSERVED)) else {
            let missing = [QUANTITY_MOVED, DAYS_OBSERVED]
                .into_iter()
                .filter(|name| inputs.number(name).is_none())
                .map(str::to_string)
                .collect();
            return Err(ExecutionError::missing(metric_id, missing));
        };

        let quantity = quantity.max(0.0);

        if days == 0.0 {
            return Ok(MetricValue::Text(UNKNOWN.to_string()));
        }

        if quantity == 0.0 {
            return Ok(MetricValue::Text(DEAD.to_string()));
        }

        let average = quantity / days;

        let mut context: Variables = definition.thresholds.clone();
        let _ = context.insert(AVERAGE_DAILY_MOVEMENT.to_string(), average);
        let _ = context.insert(QUANTITY_MOVED.to_string(), quantity);
        let _ = context.insert(DAYS_OBSERVED.to_string(), days);

        for rule in &definition.classification_rules {
            let Some(text) = rule.condition.as_deref() else {
                return Err(ExecutionError::internal(
                    metric_id,
                    app_err!("classification rule '{}' has no condition", rule.name),
                ));
            };

            let condition = Condition::parse(text).map_err(|e| {
                ExecutionError::internal(metric_id, app_err!("classification rule '{}' is malformed: {e}", rule.name))
            })?;

            if let Some(unknown) = condition.identifiers().find(|id| !context.contains_key(*id)) {
                return Err(ExecutionError::internal(
                    metric_id,
                    app_err!("classification rule '{}' references '{unknown}', which is neither a computed value nor a configured threshold", rule.name),
                ));
            }

            let holds = condition
                .evaluate(&context)
                .map_err(|e| ExecutionError::internal(metric_id, app_err!("classification rule '{}': {e}", rule.name)))?;

            if holds {
                log::debug!(target: LOG_TARGET, "{metric_id}: average {average} matched rule '{}'", rule.name);
                return Ok(MetricValue::Text(rule.name.to_uppercase()));
            }
        }

        Ok(MetricValue::Text(UNKNOWN.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ErrorKind;

    const MOVEMENT: &str = r"
metric_id: MOVEMENT_CLASS
tier: TIER_1
formula: MOVEMENT_CLASSIFICATION
time_semantics:
  type: period
thresholds:
  fast_threshold: 1.0
  slow_threshold: 0.1
classification_rules:
  - name: fast
    condition: averageDailyMovement >= fast_threshold
  - name: Slow
    condition: averageDailyMovement >= slow_threshold AND averageDailyMovement < fast_threshold
  - name: crawling
    condition: averageDailyMovement > 0
";

    fn movement() -> MetricDefinition {
        serde_yaml::from_str(MOVEMENT).unwrap()
    }

    fn classify(quantity: f64, days: f64) -> Result<MetricValue, ExecutionError> {
        MovementClassificationStrategy.execute(&movement(), &MetricInputs::values([(QUANTITY_MOVED, quantity), (DAYS_OBSERVED, days)]))
    }

    fn text(value: &MetricValue) -> &str {
        value.as_text().unwrap()
    }

    #[test]
    fn test_dead_stock() {
        assert_eq!(text(&classify(0.0, 30.0).unwrap()), DEAD);
    }

    #[test]
    fn test_negative_quantity_is_clamped() {
        assert_eq!(text(&classify(-12.0, 30.0).unwrap()), DEAD);
    }

    #[test]
    fn test_no_days_is_unknown() {
        assert_eq!(text(&classify(0.0, 0.0).unwrap()), UNKNOWN);
        assert_eq!(text(&classify(500.0, 0.0).unwrap()), UNKNOWN);
    }

    #[test]
    fn test_inclusive_boundary_is_fast() {
        assert_eq!(text(&classify(30.0, 30.0).unwrap()), "FAST");
    }

    #[test]
    fn test_rules_in_declaration_order() {
        assert_eq!(text(&classify(15.0, 30.0).unwrap()), "SLOW");
        assert_eq!(text(&classify(1.0, 30.0).unwrap()), "CRAWLING");
    }

    #[test]
    fn test_no_rule_matches() {
        let mut def = movement();
        def.classification_rules.truncate(1);
        let value = MovementClassificationStrategy
            .execute(&def, &MetricInputs::values([(QUANTITY_MOVED, 1.0), (DAYS_OBSERVED, 30.0)]))
            .unwrap();
        assert_eq!(text(&value), UNKNOWN);
    }

    #[test]
    fn test_missing_inputs_listed() {
        let err = MovementClassificationStrategy
            .execute(&movement(), &MetricInputs::default())
            .unwrap_err();
        insta::assert_snapshot!(err, @"missing required inputs for metric 'MOVEMENT_CLASS': QuantityMoved, DaysObserved");

        let err = MovementClassificationStrategy
            .execute(&movement(), &MetricInputs::values([(DAYS_OBSERVED, 30.0)]))
            .unwrap_err();
        insta::assert_snapshot!(err, @"missing required inputs for metric 'MOVEMENT_CLASS': QuantityMoved");
    }

    #[test]
    fn test_absent_threshold_is_internal() {
        let mut def = movement();
        let _ = def.thresholds.remove("fast_threshold");
        let err = MovementClassificationStrategy
            .execute(&def, &MetricInputs::values([(QUANTITY_MOVED, 30.0), (DAYS_OBSERVED, 30.0)]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().contains("fast_threshold"), "{err}");
    }

    #[test]
    fn test_ceiling_rule_without_condition_is_internal() {
        let yaml = r"
metric_id: BAD
tier: TIER_1
formula: MOVEMENT_CLASSIFICATION
time_semantics:
  type: period
classification_rules:
  - name: A
    max_cumulative_percent: 80
";
        let def: MetricDefinition = serde_yaml::from_str(yaml).unwrap();
        let err = MovementClassificationStrategy
            .execute(&def, &MetricInputs::values([(QUANTITY_MOVED, 3.0), (DAYS_OBSERVED, 30.0)]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}

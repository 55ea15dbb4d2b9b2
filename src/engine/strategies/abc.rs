use super::FormulaStrategy;
use crate::engine::{ExecutionError, MetricInputs, Record};
use crate::metrics::{ClassificationRule, MetricDefinition, MetricValue};
use core::cmp::Ordering;
use ohno::app_err;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

const LOG_TARGET: &str = "       abc";

pub const ITEM: &str = "item";
pub const ANNUAL_USAGE_QUANTITY: &str = "AnnualUsageQuantity";
pub const UNIT_COST: &str = "UnitCost";
pub const RECORDS: &str = "records";

/// Ranks items by annual consumption value and labels them A, B, C, ...
///
/// Items are sorted by `AnnualUsageQuantity × UnitCost`, highest first, and each is assigned to
/// the class with the smallest cumulative-percentage ceiling that still covers the running
/// share of total value. Only classes that end up used are labeled, in ceiling order.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbcClassificationStrategy;

#[derive(Debug)]
struct RankedItem<'a> {
    item: &'a str,
    value: f64,
}

#[derive(Debug)]
struct ClassCeiling<'a> {
    name: &'a str,
    ceiling: f64,
}

impl FormulaStrategy for AbcClassificationStrategy {
    fn execute(&self, definition: &MetricDefinition, inputs: &MetricInputs) -> Result<MetricValue, ExecutionError> {
        let metric_id = definition.metric_id.as_str();

        let Some(records) = inputs.records() else {
            return Err(ExecutionError::missing(metric_id, vec![RECORDS.to_string()]));
        };

        let classes = class_ceilings(&definition.classification_rules).map_err(|e| ExecutionError::internal(metric_id, e))?;
        let items = rank_items(metric_id, records)?;

        let last = classes.len() - 1;
        let grand_total: f64 = items.iter().map(|i| i.value).sum();

        let mut assigned = Vec::with_capacity(items.len());
        let mut running = 0.0;

        for item in &items {
            let class = if grand_total == 0.0 {
                last
            } else {
                running += item.value;
                let cumulative_percent = running / grand_total * 100.0;
                classes.iter().position(|c| c.ceiling >= cumulative_percent).unwrap_or(last)
            };

            log::debug!(target: LOG_TARGET, "{metric_id}: '{}' (value {}) falls in class '{}'", item.item, item.value, classes[class].name);
            assigned.push((item.item, class));
        }

        let used: BTreeSet<usize> = assigned.iter().map(|(_, class)| *class).collect();
        let labels: BTreeMap<usize, String> = used.into_iter().enumerate().map(|(rank, class)| (class, canonical_label(rank))).collect();

        let result = assigned
            .into_iter()
            .map(|(item, class)| (item.to_string(), labels.get(&class).cloned().unwrap_or_default()))
            .collect();

        Ok(MetricValue::Classes(result))
    }
}

/// Class ceilings, ascending. Ties keep declaration order.
fn class_ceilings(rules: &[ClassificationRule]) -> crate::Result<Vec<ClassCeiling<'_>>> {
    let mut classes = rules
        .iter()
        .map(|rule| {
            rule.max_cumulative_percent
                .filter(|c| c.is_finite())
                .map(|ceiling| ClassCeiling {
                    name: &rule.name,
                    ceiling,
                })
                .ok_or_else(|| app_err!("classification rule '{}' has no max_cumulative_percent", rule.name))
        })
        .collect::<crate::Result<Vec<_>>>()?;

    if classes.is_empty() {
        return Err(app_err!("no classification rules are configured"));
    }

    classes.sort_by(|a, b| a.ceiling.total_cmp(&b.ceiling));
    Ok(classes)
}

/// Items with nonzero usage and a usable unit cost, highest value first.
fn rank_items<'a>(metric_id: &str, records: &'a [Record]) -> Result<Vec<RankedItem<'a>>, ExecutionError> {
    let mut missing = Vec::new();
    let mut items = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let quantity = number(record, ANNUAL_USAGE_QUANTITY);

        // zero usage drops the record before anything else is looked at
        if quantity == Some(0.0) {
            continue;
        }

        let item = record.get(ITEM).and_then(Value::as_str).filter(|s| !s.trim().is_empty());

        if item.is_none() {
            missing.push(format!("{RECORDS}[{index}].{ITEM}"));
        }

        if quantity.is_none() {
            missing.push(format!("{RECORDS}[{index}].{ANNUAL_USAGE_QUANTITY}"));
        }

        let (Some(item), Some(quantity)) = (item, quantity) else {
            continue;
        };

        let Some(unit_cost) = number(record, UNIT_COST) else {
            log::warn!(target: LOG_TARGET, "{metric_id}: dropping '{item}', which has no usable {UNIT_COST}");
            continue;
        };

        items.push(RankedItem {
            item,
            value: quantity * unit_cost,
        });
    }

    if !missing.is_empty() {
        return Err(ExecutionError::missing(metric_id, missing));
    }

    items.sort_by(|a, b| match b.value.total_cmp(&a.value) {
        Ordering::Equal => a.item.cmp(b.item),
        ordering => ordering,
    });

    Ok(items)
}

fn number(record: &Record, field: &str) -> Option<f64> {
    record.get(field).and_then(Value::as_f64).filter(|v| v.is_finite())
}

/// `A`, `B`, ... `Z`, `AA`, `AB`, ...
fn canonical_label(rank: usize) -> String {
    let mut label = Vec::new();
    let mut n = rank + 1;

    while n > 0 {
        n -= 1;
        label.push(b'A' + u8::try_from(n % 26).unwrap_or_default());
        n /= 26;
    }

    label.iter().rev().map(|b| char::from(*b)).collect()
}

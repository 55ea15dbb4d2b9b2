use super::FormulaStrategy;
use crate::engine::{ExecutionError, MetricInputs};
use crate::expr::{EvalError, Expression, Variables};
use crate::metrics::{FormulaKind, MetricDefinition, MetricValue, VariableDefinition};
use ohno::app_err;

const LOG_TARGET: &str = "arithmetic";

/// Evaluates a metric whose formula is an arithmetic expression
///
/// Variables resolve from direct inputs first, then derived variables are computed from the
/// ones already resolved. Edge cases are checked in declaration order before the primary
/// formula; the first that holds supplies the result verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArithmeticStrategy;

impl FormulaStrategy for ArithmeticStrategy {
    fn execute(&self, definition: &MetricDefinition, inputs: &MetricInputs) -> Result<MetricValue, ExecutionError> {
        let metric_id = definition.metric_id.as_str();

        let FormulaKind::Expression(text) = &definition.formula else {
            return Err(ExecutionError::internal(
                metric_id,
                app_err!("formula '{}' is not an arithmetic expression", definition.formula),
            ));
        };

        let formula =
            Expression::parse(text).map_err(|e| ExecutionError::internal(metric_id, app_err!("primary formula is malformed: {e}")))?;

        let variables = resolve_variables(definition, inputs)?;

        for edge_case in &definition.edge_cases {
            let compiled = edge_case.compile().map_err(|e| ExecutionError::internal(metric_id, e))?;
            if let Some(result) = compiled.check(&variables).map_err(|e| ExecutionError::internal(metric_id, e))? {
                log::debug!(target: LOG_TARGET, "Edge case '{}' matched for {metric_id}", compiled.condition);
                return Ok(MetricValue::from(result));
            }
        }

        let value = formula
            .evaluate_with(|name| variables.get(name).copied().or_else(|| inputs.number(name)))
            .map_err(|e| match e {
                EvalError::MissingVariable(name) => ExecutionError::missing(metric_id, vec![name]),
                EvalError::Syntax { .. } => ExecutionError::internal(metric_id, app_err!("{e}")),
            })?;

        Ok(MetricValue::Number(round_to_precision(value, definition.output.precision)))
    }
}

/// Round half away from zero at `precision` decimal places. Non-finite values pass through.
#[must_use]
pub fn round_to_precision(value: f64, precision: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let scale = 10_f64.powi(i32::try_from(precision).unwrap_or(i32::MAX));
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }

    scaled.round() / scale
}

/// Resolve every declared variable. Direct inputs must be finite; a derived value may be
/// infinite or NaN, and fails only if the primary formula reads it.
///
/// Derived variables are computed in repeated passes so one may reference another. Anything
/// still unresolved once a pass makes no progress is reported as missing, all names at once.
fn resolve_variables(definition: &MetricDefinition, inputs: &MetricInputs) -> Result<Variables, ExecutionError> {
    let metric_id = definition.metric_id.as_str();
    let mut resolved = Variables::new();
    let mut pending = Vec::new();

    for (name, variable) in &definition.variables {
        match inputs.number(name) {
            Some(value) => {
                let _ = resolved.insert(name.clone(), value);
            }
            None => pending.push((name, variable)),
        }
    }

    loop {
        let before = pending.len();
        let mut unresolved = Vec::with_capacity(before);

        for (name, variable) in pending {
            match derive(metric_id, name, variable, &resolved)? {
                Some(value) => {
                    log::debug!(target: LOG_TARGET, "Derived {name} = {value} for {metric_id}");
                    let _ = resolved.insert(name.clone(), value);
                }
                None => unresolved.push((name, variable)),
            }
        }

        pending = unresolved;
        if pending.is_empty() || pending.len() == before {
            break;
        }
    }

    if !pending.is_empty() {
        return Err(ExecutionError::missing(
            metric_id,
            pending.into_iter().map(|(name, _)| name.clone()).collect(),
        ));
    }

    Ok(resolved)
}

fn derive(metric_id: &str, name: &str, variable: &VariableDefinition, resolved: &Variables) -> Result<Option<f64>, ExecutionError> {
    let Some(text) = variable.derived_expression() else {
        return Ok(None);
    };

    let expression = Expression::parse(&text)
        .map_err(|e| ExecutionError::internal(metric_id, app_err!("derived variable '{name}' is malformed: {e}")))?;

    // A non-finite result still counts as resolved; edge cases may guard it.
    match expression.evaluate(resolved) {
        Ok(value) => Ok(Some(value)),
        Err(EvalError::MissingVariable(_)) => Ok(None),
        Err(e) => Err(ExecutionError::internal(metric_id, app_err!("derived variable '{name}': {e}"))),
    }
}

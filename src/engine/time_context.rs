use super::{ExecutionContext, ExecutionError, TimeContext};
use crate::metrics::{AS_OF_DATE, MetricDefinition, PERIOD_END, PERIOD_START, TimeSemanticsType};
use chrono::NaiveDate;

/// Resolve the time window a request supplies against a metric's declared time semantics.
///
/// Fields named in `required_dates` are checked first, then the fields the semantics type
/// itself needs. A period whose bounds are both calendar dates must not end before it starts.
///
/// # Errors
///
/// Returns [`ExecutionError::InvalidTimeContext`] if a field is missing or blank, or the period
/// is reversed.
pub fn resolve_time_context(definition: &MetricDefinition, context: &ExecutionContext) -> Result<TimeContext, ExecutionError> {
    let metric_id = definition.metric_id.as_str();
    let semantics = &definition.time_semantics;

    let missing: Vec<_> = semantics
        .required_dates
        .iter()
        .filter(|name| context.date(name).is_none())
        .map(String::as_str)
        .collect();

    if !missing.is_empty() {
        return Err(ExecutionError::time_context(
            metric_id,
            format!("required date field(s) missing or blank: {}", missing.join(", ")),
        ));
    }

    match semantics.kind {
        TimeSemanticsType::PointInTime => {
            let Some(as_of_date) = context.date(AS_OF_DATE) else {
                return Err(ExecutionError::time_context(
                    metric_id,
                    format!("a point_in_time metric requires '{AS_OF_DATE}'"),
                ));
            };

            Ok(TimeContext::PointInTime {
                as_of_date: as_of_date.to_string(),
            })
        }

        TimeSemanticsType::Period => {
            let (Some(start), Some(end)) = (context.date(PERIOD_START), context.date(PERIOD_END)) else {
                return Err(ExecutionError::time_context(
                    metric_id,
                    format!("a period metric requires both '{PERIOD_START}' and '{PERIOD_END}'"),
                ));
            };

            if let (Ok(start_date), Ok(end_date)) = (start.parse::<NaiveDate>(), end.parse::<NaiveDate>())
                && start_date > end_date
            {
                return Err(ExecutionError::time_context(
                    metric_id,
                    format!("period starts on {start} but ends earlier, on {end}"),
                ));
            }

            Ok(TimeContext::Period {
                period_start: start.to_string(),
                period_end: end.to_string(),
            })
        }
    }
}

use crate::Result;
use crate::expr::{Condition, Variables};
use core::fmt;
use ohno::app_err;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Matches the prose form: ``if `<variable>` equals `<number>`, return `<number or null>` ``
static LEGACY_RULE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*if\s+`?([A-Za-z_][A-Za-z0-9_]*)`?\s+equals\s+`?(-?\d+(?:\.\d+)?)`?\s*,?\s*(?:then\s+)?return\s+`?(null|-?\d+(?:\.\d+)?)`?\s*\.?\s*$",
    )
    .expect("invalid regex")
});

/// An override rule declared on a metric, as written in the definition
///
/// Either structured (`when` / `result`) or the older prose form. Anything else is kept so it
/// can be reported when the metric executes, rather than being silently skipped.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum EdgeCase {
    Rule(EdgeCaseRule),
    Text(String),
    Unrecognized(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeCaseRule {
    /// Condition in the shared comparison grammar
    pub when: String,

    /// Value returned verbatim when the condition holds; `None` returns null
    #[serde(default)]
    pub result: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An edge case ready for evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledEdgeCase {
    pub condition: Condition,
    pub result: Option<f64>,
}

impl CompiledEdgeCase {
    /// The override value if the condition holds for `variables`.
    ///
    /// # Errors
    ///
    /// Returns an error if the condition references a variable that was not resolved.
    pub fn check(&self, variables: &Variables) -> Result<Option<Option<f64>>> {
        // no comparison against an infinite or NaN value holds
        if self.condition.identifiers().any(|name| variables.get(name).is_some_and(|v| !v.is_finite())) {
            return Ok(None);
        }

        let holds = self
            .condition
            .evaluate(variables)
            .map_err(|e| app_err!("edge case '{}' cannot be evaluated: {e}", self.condition))?;
        Ok(holds.then_some(self.result))
    }
}

impl EdgeCase {
    /// Parse this rule into a condition and a result.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule text is not in a governed form.
    pub fn compile(&self) -> Result<CompiledEdgeCase> {
        match self {
            Self::Rule(rule) => {
                let condition =
                    Condition::parse(&rule.when).map_err(|e| app_err!("edge case condition '{}' is malformed: {e}", rule.when))?;
                Ok(CompiledEdgeCase {
                    condition,
                    result: rule.result,
                })
            }
            Self::Text(text) => compile_legacy(text),
            Self::Unrecognized(value) => Err(app_err!("edge case {value} is not a governed rule")),
        }
    }
}

impl fmt::Display for EdgeCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rule(rule) => match rule.result {
                Some(result) => write!(f, "when {} return {result}", rule.when),
                None => write!(f, "when {} return null", rule.when),
            },
            Self::Text(text) => f.write_str(text),
            Self::Unrecognized(value) => write!(f, "{value}"),
        }
    }
}

fn compile_legacy(text: &str) -> Result<CompiledEdgeCase> {
    let caps = LEGACY_RULE_REGEX
        .captures(text)
        .ok_or_else(|| app_err!("edge case '{text}' does not match 'if <variable> equals <number>, return <number or null>'"))?;

    let (Some(variable), Some(equals), Some(result)) = (caps.get(1), caps.get(2), caps.get(3)) else {
        return Err(app_err!("edge case '{text}' is incomplete"));
    };

    let equals: f64 = equals
        .as_str()
        .parse()
        .map_err(|_e| app_err!("edge case '{text}' compares against an invalid number"))?;

    let result = if result.as_str().eq_ignore_ascii_case("null") {
        None
    } else {
        Some(
            result
                .as_str()
                .parse::<f64>()
                .map_err(|_e| app_err!("edge case '{text}' returns an invalid number"))?,
        )
    };

    let condition = Condition::equals(variable.as_str(), equals).map_err(|e| app_err!("edge case '{text}' is malformed: {e}"))?;

    Ok(CompiledEdgeCase { condition, result })
}

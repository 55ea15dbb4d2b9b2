use crate::Result;
use camino::Utf8Path;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;

/// The default governance schema, embedded from `default_schema.yml`
pub const DEFAULT_SCHEMA_YAML: &str = include_str!("../../default_schema.yml");

/// Rules a metric definition document must satisfy before it is accepted
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct GovernanceSchema {
    #[serde(default)]
    pub required_fields: Vec<String>,

    #[serde(default)]
    pub allowed_tiers: Vec<String>,

    #[serde(default)]
    pub time_semantics_rules: TimeSemanticsRules,

    #[serde(default)]
    pub test_rules: TestRules,

    #[serde(default)]
    pub edge_case_rules: EdgeCaseRules,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct TimeSemanticsRules {
    #[serde(default)]
    pub allowed_types: Vec<String>,

    /// The exact set of date fields each type must require. Types not listed here must require
    /// at least a start and an end.
    #[serde(default)]
    pub required_dates_by_type: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TestRules {
    #[serde(default = "default_minimum_test_cases")]
    pub minimum_test_cases: usize,
}

impl Default for TestRules {
    fn default() -> Self {
        Self {
            minimum_test_cases: default_minimum_test_cases(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EdgeCaseRules {
    #[serde(default = "default_minimum_edge_cases")]
    pub minimum_count: usize,

    #[serde(default)]
    pub require_division_by_zero_handling: DivisionRule,
}

impl Default for EdgeCaseRules {
    fn default() -> Self {
        Self {
            minimum_count: default_minimum_edge_cases(),
            require_division_by_zero_handling: DivisionRule::default(),
        }
    }
}

const fn default_minimum_test_cases() -> usize {
    2
}

const fn default_minimum_edge_cases() -> usize {
    1
}

/// When a definition's edge cases must address division by zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(try_from = "DivisionRuleRepr", into = "DivisionRuleRepr")]
pub enum DivisionRule {
    #[default]
    Never,
    Always,

    /// Only when the definition lists `division` among its `math_operations`
    WhenMathOperationsIncludeDivision,
}

const WHEN_DIVISION: &str = "when_math_operations_includes_division";

#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum DivisionRuleRepr {
    Flag(bool),
    Condition(String),
}

impl TryFrom<DivisionRuleRepr> for DivisionRule {
    type Error = String;

    fn try_from(value: DivisionRuleRepr) -> Result<Self, Self::Error> {
        match value {
            DivisionRuleRepr::Flag(true) => Ok(Self::Always),
            DivisionRuleRepr::Flag(false) => Ok(Self::Never),
            DivisionRuleRepr::Condition(s) if s == WHEN_DIVISION => Ok(Self::WhenMathOperationsIncludeDivision),
            DivisionRuleRepr::Condition(s) => Err(format!("expected true, false, or '{WHEN_DIVISION}', found '{s}'")),
        }
    }
}

impl From<DivisionRule> for DivisionRuleRepr {
    fn from(value: DivisionRule) -> Self {
        match value {
            DivisionRule::Never => Self::Flag(false),
            DivisionRule::Always => Self::Flag(true),
            DivisionRule::WhenMathOperationsIncludeDivision => Self::Condition(WHEN_DIVISION.to_string()),
        }
    }
}

impl GovernanceSchema {
    /// Load a schema from a file, or the embedded default when no path is given.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let Some(path) = path else {
            return serde_yaml::from_str(DEFAULT_SCHEMA_YAML).into_app_err("parsing the default governance schema");
        };

        let text = fs::read_to_string(path).into_app_err_with(|| format!("reading governance schema from {path}"))?;

        let extension = path.extension().unwrap_or_default();
        let schema = match extension {
            "toml" => toml::from_str(&text).into_app_err_with(|| format!("parsing TOML governance schema from {path}"))?,
            "yml" | "yaml" => serde_yaml::from_str(&text).into_app_err_with(|| format!("parsing YAML governance schema from {path}"))?,
            "json" => serde_json::from_str(&text).into_app_err_with(|| format!("parsing JSON governance schema from {path}"))?,
            _ => return Err(app_err!("unsupported governance schema file extension: {extension}")),
        };

        Ok(schema)
    }

    /// Write the default schema to a file, in the format its extension names.
    ///
    /// YAML output is the embedded file verbatim, comments included.
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        let extension = output_path.extension().unwrap_or_default();
        let text = match extension {
            "yml" | "yaml" => DEFAULT_SCHEMA_YAML.to_string(),
            "toml" => toml::to_string_pretty(&Self::load(None)?)
                .into_app_err_with(|| format!("serializing governance schema to TOML for saving to {output_path}"))?,
            "json" => serde_json::to_string_pretty(&Self::load(None)?)
                .into_app_err_with(|| format!("serializing governance schema to JSON for saving to {output_path}"))?,
            _ => return Err(app_err!("unsupported governance schema file extension: {extension}")),
        };

        fs::write(output_path, text).into_app_err_with(|| format!("writing governance schema to {output_path}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn test_default_schema_parses() {
        let schema = GovernanceSchema::load(None).unwrap();
        assert!(schema.required_fields.iter().any(|f| f == "metric_id"));
        assert_eq!(schema.allowed_tiers, vec!["TIER_1", "TIER_2", "TIER_3"]);
        assert_eq!(schema.time_semantics_rules.required_dates_by_type["period"], vec!["period_start", "period_end"]);
        assert_eq!(schema.test_rules.minimum_test_cases, 2);
        assert_eq!(
            schema.edge_case_rules.require_division_by_zero_handling,
            DivisionRule::WhenMathOperationsIncludeDivision
        );
    }

    #[test]
    fn test_missing_sections_default() {
        let schema: GovernanceSchema = serde_yaml::from_str("allowed_tiers: [TIER_1]\n").unwrap();
        assert_eq!(schema.test_rules.minimum_test_cases, 2);
        assert_eq!(schema.edge_case_rules.minimum_count, 1);
        assert_eq!(schema.edge_case_rules.require_division_by_zero_handling, DivisionRule::Never);
    }

    #[test]
    fn test_division_rule_forms() {
        let rules: EdgeCaseRules = serde_yaml::from_str("require_division_by_zero_handling: true\n").unwrap();
        assert_eq!(rules.require_division_by_zero_handling, DivisionRule::Always);

        let result: Result<EdgeCaseRules, _> = serde_yaml::from_str("require_division_by_zero_handling: sometimes\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_save_default_round_trips() {
        let dir = tempfile::tempdir().unwrap();

        for name in ["schema.yml", "schema.toml", "schema.json"] {
            let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap();
            GovernanceSchema::save_default(&path).unwrap();
            assert_eq!(GovernanceSchema::load(Some(&path)).unwrap(), GovernanceSchema::load(None).unwrap(), "{name}");
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("schema.ini")).unwrap();
        let _ = GovernanceSchema::save_default(&path).unwrap_err();
    }
}

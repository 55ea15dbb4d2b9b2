use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The computed value of a metric
///
/// Serialized untagged: a JSON number, string, null, or an object of item name to class label.
/// Non-finite numbers serialize as `null`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
    Classes(BTreeMap<String, String>),
    Null,
}

impl MetricValue {
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_classes(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Classes(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Null => f.write_str("NULL"),
            Self::Classes(classes) => {
                f.write_str("{")?;
                for (i, (item, class)) in classes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}: {class}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<Option<f64>> for MetricValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Null, Self::Number)
    }
}

use super::MetricDefinition;
use crate::Result;
use ohno::bail;
use std::collections::HashMap;

const LOG_TARGET: &str = "  registry";

/// Read-only lookup from metric identifier to its governed definition
///
/// Built once per process. Nothing mutates a registry after construction, so it can be shared
/// across threads behind an `Arc` without synchronization.
#[derive(Debug, Default)]
pub struct MetricRegistry {
    definitions: HashMap<String, MetricDefinition>,
}

impl MetricRegistry {
    /// Build a registry from a set of definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if two definitions share a `metric_id`, or if a `metric_id` is blank.
    pub fn new(definitions: impl IntoIterator<Item = MetricDefinition>) -> Result<Self> {
        let mut map = HashMap::new();

        for def in definitions {
            if def.metric_id.trim().is_empty() {
                bail!("metric definition has a blank metric_id");
            }

            if map.contains_key(&def.metric_id) {
                bail!("metric '{}' is defined more than once", def.metric_id);
            }

            let _ = map.insert(def.metric_id.clone(), def);
        }

        log::info!(target: LOG_TARGET, "Registered {} metric definition(s)", map.len());

        Ok(Self { definitions: map })
    }

    #[must_use]
    pub fn get(&self, metric_id: &str) -> Option<&MetricDefinition> {
        self.definitions.get(metric_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Registered identifiers in sorted order
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.definitions.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

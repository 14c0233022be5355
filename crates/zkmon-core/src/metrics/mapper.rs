//! Reconciles a raw sample against the metric catalog.
//!
//! Every catalog row is tried independently. A missing raw key or a value
//! that cannot be recorded under the row's semantic type only drops that
//! row; the pass as a whole fails only when fewer than [`MIN_METRICS`]
//! entries survive.

use tracing::{debug, warn};

use super::catalog::{MetricDefinition, SemanticType};
use crate::model::{CanonicalMetricSet, Metric, RawSample};

/// Minimum number of mapped entries for a cycle to count as successful.
///
/// Host and port are always injected, so anything below two means the
/// probe contributed nothing usable.
pub const MIN_METRICS: usize = 2;

/// Error type for catalog reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub enum MapError {
    /// A raw value cannot be recorded under the declared semantic type.
    NotRepresentable {
        metric: String,
        value: String,
        semantic_type: SemanticType,
    },
    /// The cycle produced too few metrics to be useful.
    InsufficientMetrics { found: usize },
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::NotRepresentable {
                metric,
                value,
                semantic_type,
            } => write!(
                f,
                "cannot record '{}' as {} for metric {}",
                value, semantic_type, metric
            ),
            MapError::InsufficientMetrics { found } => write!(
                f,
                "no metrics were found on the status response ({} mapped, need {})",
                found, MIN_METRICS
            ),
        }
    }
}

impl std::error::Error for MapError {}

/// Builds the canonical metric set for one cycle.
///
/// Returns [`MapError::InsufficientMetrics`] when fewer than
/// [`MIN_METRICS`] rows could be recorded.
pub fn populate(
    sample: &RawSample,
    catalog: &[MetricDefinition],
) -> Result<CanonicalMetricSet, MapError> {
    if sample.is_empty() {
        debug!("Metrics data from status response not found");
    }

    let mut set = CanonicalMetricSet::new();

    for (name, metric) in catalog.iter().filter_map(|def| map_one(sample, def)) {
        set.insert(name, metric);
    }

    if set.len() < MIN_METRICS {
        return Err(MapError::InsufficientMetrics { found: set.len() });
    }

    Ok(set)
}

fn map_one(sample: &RawSample, def: &MetricDefinition) -> Option<(&'static str, Metric)> {
    let Some(raw) = sample.get(def.raw_key) else {
        debug!(
            "Can't find raw metric in results for {} [{}]",
            def.name, def.raw_key
        );
        return None;
    };

    match Metric::new(def.name, raw.clone(), def.semantic_type) {
        Ok(metric) => Some((def.name, metric)),
        Err(e) => {
            warn!("Error setting value ({}): {}", raw.kind(), e);
            None
        }
    }
}

//! Metric catalog and the reconciliation of raw samples against it.
//!
//! - [`catalog`]: the fixed table of canonical metrics (name, raw key, type)
//! - [`mapper`]: turns a [`RawSample`](crate::model::RawSample) into a
//!   [`CanonicalMetricSet`](crate::model::CanonicalMetricSet)

pub mod catalog;
pub mod mapper;

pub use catalog::{CATALOG, MetricDefinition, SemanticType};
pub use mapper::{MIN_METRICS, MapError, populate};

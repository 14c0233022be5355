//! Data model shared by the collection pipeline.
//!
//! ```text
//! probe output ──parse──▶ RawSample ──populate──▶ CanonicalMetricSet
//!  (free text)          (raw key → Value)       (name → Metric)
//! ```
//!
//! A `RawSample` lives for exactly one collection cycle and is consumed by
//! the mapper. A `CanonicalMetricSet` is built once per cycle and handed to
//! whoever emits it.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;

use crate::metrics::{MapError, SemanticType};

/// A typed value recovered from a probe response token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

impl Value {
    /// Returns the value as a number suitable for a gauge.
    ///
    /// Booleans become `0`/`1`; strings are accepted only when they hold a
    /// finite decimal number.
    pub fn to_gauge(&self) -> Option<Value> {
        match self {
            Value::Integer(i) => Some(Value::Integer(*i)),
            Value::Float(f) if f.is_finite() => Some(Value::Float(*f)),
            Value::Float(_) => None,
            Value::Boolean(b) => Some(Value::Integer(i64::from(*b))),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::Float),
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

/// Raw key/value pairs for one collection cycle, keyed by the probe's own
/// key names (`zk_avg_latency`, ...) plus the injected context keys.
pub type RawSample = HashMap<String, Value>;

/// One recorded metric: its value and how downstream should treat it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub value: Value,
    pub semantic_type: SemanticType,
}

impl Metric {
    /// Records `value` under `semantic_type`.
    ///
    /// Attributes accept any value as-is. Gauges are normalized through
    /// [`Value::to_gauge`] and rejected when the value is not numeric.
    pub fn new(name: &str, value: Value, semantic_type: SemanticType) -> Result<Self, MapError> {
        let value = match semantic_type {
            SemanticType::Attribute => value,
            SemanticType::Gauge => {
                value
                    .to_gauge()
                    .ok_or_else(|| MapError::NotRepresentable {
                        metric: name.to_string(),
                        value: value.to_string(),
                        semantic_type,
                    })?
            }
        };

        Ok(Self {
            value,
            semantic_type,
        })
    }
}

/// Normalized output of one collection cycle, keyed by canonical name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CanonicalMetricSet {
    metrics: BTreeMap<String, Metric>,
}

impl CanonicalMetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a metric, replacing any previous entry with the same name.
    pub fn insert(&mut self, name: impl Into<String>, metric: Metric) {
        self.metrics.insert(name.into(), metric);
    }

    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.metrics.get(name)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Iterates entries in canonical-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Metric)> {
        self.metrics.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates only the entries of the given semantic type.
    pub fn of_type(&self, semantic_type: SemanticType) -> impl Iterator<Item = (&str, &Metric)> {
        self.iter()
            .filter(move |(_, m)| m.semantic_type == semantic_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_gauge_numeric() {
        assert_eq!(Value::Integer(7).to_gauge(), Some(Value::Integer(7)));
        assert_eq!(Value::Float(1.5).to_gauge(), Some(Value::Float(1.5)));
        assert_eq!(Value::Float(f64::NAN).to_gauge(), None);
    }

    #[test]
    fn test_to_gauge_boolean() {
        assert_eq!(Value::Boolean(true).to_gauge(), Some(Value::Integer(1)));
        assert_eq!(Value::Boolean(false).to_gauge(), Some(Value::Integer(0)));
    }

    #[test]
    fn test_to_gauge_string() {
        assert_eq!(Value::from(" 2.5 ").to_gauge(), Some(Value::Float(2.5)));
        assert_eq!(Value::from("leader").to_gauge(), None);
    }

    #[test]
    fn test_metric_new_gauge_rejects_text() {
        let err = Metric::new("avg_latency", Value::from("n/a"), SemanticType::Gauge).unwrap_err();
        assert!(matches!(err, MapError::NotRepresentable { .. }));
        assert!(err.to_string().contains("avg_latency"));
    }

    #[test]
    fn test_metric_new_attribute_keeps_value() {
        let m = Metric::new("zk_port", Value::Integer(2181), SemanticType::Attribute).unwrap();
        assert_eq!(m.value, Value::Integer(2181));
        assert_eq!(m.semantic_type, SemanticType::Attribute);
    }

    #[test]
    fn test_value_serializes_untagged() {
        let json = serde_json::to_string(&vec![
            Value::Integer(1),
            Value::Float(0.5),
            Value::Boolean(true),
            Value::from("x"),
        ])
        .unwrap();
        assert_eq!(json, r#"[1,0.5,true,"x"]"#);
    }

    #[test]
    fn test_metric_set_is_sorted() {
        let mut set = CanonicalMetricSet::new();
        set.insert(
            "znode_count",
            Metric::new("znode_count", Value::Integer(5), SemanticType::Gauge).unwrap(),
        );
        set.insert(
            "avg_latency",
            Metric::new("avg_latency", Value::Integer(1), SemanticType::Gauge).unwrap(),
        );
        let names: Vec<&str> = set.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["avg_latency", "znode_count"]);
    }
}

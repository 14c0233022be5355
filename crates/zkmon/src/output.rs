//! JSON rendering of a canonical metric set.
//!
//! One line per cycle on stdout; logs go to stderr.

use std::collections::BTreeMap;

use serde::Serialize;
use zkmon_core::metrics::SemanticType;
use zkmon_core::model::{CanonicalMetricSet, Value};

/// Event type tag attached to every emitted sample.
pub const EVENT_TYPE: &str = "ZookeeperSample";

/// Emitted document for one collection cycle.
#[derive(Debug, Serialize)]
pub struct Sample<'a> {
    /// Unix timestamp (seconds since epoch).
    pub timestamp: i64,
    pub event_type: &'static str,
    /// Every metric, keyed by canonical name.
    pub metrics: BTreeMap<&'a str, &'a Value>,
    /// Names of the metrics that are attributes rather than gauges.
    pub attributes: Vec<&'a str>,
}

impl<'a> Sample<'a> {
    pub fn new(timestamp: i64, set: &'a CanonicalMetricSet) -> Self {
        Self {
            timestamp,
            event_type: EVENT_TYPE,
            metrics: set.iter().map(|(name, m)| (name, &m.value)).collect(),
            attributes: set
                .of_type(SemanticType::Attribute)
                .map(|(name, _)| name)
                .collect(),
        }
    }
}

/// Serializes one sample as a single JSON line, or indented when `pretty`.
pub fn render(sample: &Sample<'_>, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(sample)
    } else {
        serde_json::to_string(sample)
    }
}

/// Short human summary for the log line of a cycle.
pub fn describe(set: &CanonicalMetricSet) -> String {
    let state = set
        .get("server_state")
        .map(|m| m.value.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let alive = matches!(set.get("status").map(|m| &m.value), Some(Value::Integer(1)));

    format!(
        "{} metrics, state={}, {}",
        set.len(),
        state,
        if alive { "alive" } else { "not responding" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkmon_core::collector::{Collector, MockProbe};

    fn leader_set() -> CanonicalMetricSet {
        Collector::new(MockProbe::leader(), "zk1", 2181)
            .collect()
            .unwrap()
    }

    #[test]
    fn render_emits_typed_values() {
        let set = leader_set();
        let json = render(&Sample::new(1_700_000_000, &set), false).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["timestamp"], 1_700_000_000);
        assert_eq!(parsed["event_type"], "ZookeeperSample");
        assert_eq!(parsed["metrics"]["znode_count"], 52);
        assert_eq!(parsed["metrics"]["server_state"], "leader");
        assert_eq!(parsed["metrics"]["zk_port"], "2181");
        assert_eq!(
            parsed["attributes"],
            serde_json::json!(["server_state", "zk_host", "zk_port"])
        );
        assert!(!json.contains('\n'));
    }

    #[test]
    fn render_pretty_is_multiline() {
        let set = leader_set();
        let json = render(&Sample::new(0, &set), true).unwrap();
        assert!(json.contains('\n'));
    }

    #[test]
    fn describe_reports_state() {
        let set = leader_set();
        assert_eq!(describe(&set), "20 metrics, state=leader, alive");

        let down = Collector::new(MockProbe::new(), "zk1", 2181)
            .collect()
            .unwrap();
        assert_eq!(describe(&down), "3 metrics, state=unknown, not responding");
    }
}

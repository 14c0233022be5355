//! Static catalog of the metrics exported from a `mntr` response.

use std::fmt;

use serde::Serialize;

/// How downstream consumers should treat a metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    /// Numeric point-in-time measurement.
    Gauge,
    /// Descriptive value (role, host, port).
    Attribute,
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Gauge => f.write_str("gauge"),
            SemanticType::Attribute => f.write_str("attribute"),
        }
    }
}

/// Mapping rule from a raw probe key to a canonical metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDefinition {
    pub name: &'static str,
    pub raw_key: &'static str,
    pub semantic_type: SemanticType,
}

impl MetricDefinition {
    const fn gauge(name: &'static str, raw_key: &'static str) -> Self {
        Self {
            name,
            raw_key,
            semantic_type: SemanticType::Gauge,
        }
    }

    const fn attribute(name: &'static str, raw_key: &'static str) -> Self {
        Self {
            name,
            raw_key,
            semantic_type: SemanticType::Attribute,
        }
    }
}

/// Raw key under which the probe host is injected into every sample.
pub const HOST_KEY: &str = "zk_host";
/// Raw key under which the probe port is injected into every sample.
pub const PORT_KEY: &str = "zk_port";
/// Raw key under which the liveness result (`0`/`1`) is injected.
pub const STATUS_KEY: &str = "status";

/// Every metric the collector knows how to export.
///
/// Order carries no meaning; each row is an independent rule. Servers that
/// do not expose a key (e.g. `zk_followers` on a follower) simply yield no
/// entry for that row.
pub static CATALOG: [MetricDefinition; 20] = [
    MetricDefinition::gauge("avg_latency", "zk_avg_latency"),
    MetricDefinition::gauge("max_latency", "zk_max_latency"),
    MetricDefinition::gauge("min_latency", "zk_min_latency"),
    MetricDefinition::gauge("packets_received", "zk_packets_received"),
    MetricDefinition::gauge("packets_sent", "zk_packets_sent"),
    MetricDefinition::gauge("outstanding_requests", "zk_outstanding_requests"),
    MetricDefinition::attribute("server_state", "zk_server_state"),
    MetricDefinition::attribute("zk_host", HOST_KEY),
    MetricDefinition::attribute("zk_port", PORT_KEY),
    MetricDefinition::gauge("znode_count", "zk_znode_count"),
    MetricDefinition::gauge("watch_count", "zk_watch_count"),
    MetricDefinition::gauge("ephemerals_count", "zk_ephemerals_count"),
    MetricDefinition::gauge("approximate_data_size", "zk_approximate_data_size"),
    MetricDefinition::gauge("followers", "zk_followers"),
    MetricDefinition::gauge("synced_followers", "zk_synced_followers"),
    MetricDefinition::gauge("pending_syncs", "zk_pending_syncs"),
    MetricDefinition::gauge("open_file_descriptor_count", "zk_open_file_descriptor_count"),
    MetricDefinition::gauge("max_file_descriptor_count", "zk_max_file_descriptor_count"),
    MetricDefinition::gauge("num_alive_connections", "zk_num_alive_connections"),
    MetricDefinition::gauge("status", STATUS_KEY),
];

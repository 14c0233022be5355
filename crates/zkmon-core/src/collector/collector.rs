//! Collection cycle: probe, parse, map.
//!
//! The `Collector` runs the statistics and liveness commands through a
//! [`ProbeExecutor`], builds the raw sample for the cycle and reconciles it
//! against the catalog.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::parser::{health_status, parse_response};
use super::traits::ProbeExecutor;
use crate::metrics::catalog::{CATALOG, HOST_KEY, PORT_KEY, STATUS_KEY};
use crate::metrics::{MapError, populate};
use crate::model::{CanonicalMetricSet, RawSample, Value};

/// Command returning `key value` statistics lines.
pub const STATS_COMMAND: &str = "mntr";
/// Liveness command; a healthy server answers `imok`.
pub const HEALTH_COMMAND: &str = "ruok";

/// Error type for a collection cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectError {
    /// Reconciliation against the catalog failed.
    Mapping(MapError),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Mapping(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::Mapping(e) => Some(e),
        }
    }
}

impl From<MapError> for CollectError {
    fn from(e: MapError) -> Self {
        CollectError::Mapping(e)
    }
}

/// Timing of each phase of the last cycle.
#[derive(Debug, Clone, Default)]
pub struct CollectorTiming {
    /// Whole cycle.
    pub total: Duration,
    /// Statistics command plus parsing.
    pub stats: Duration,
    /// Liveness command.
    pub health: Duration,
    /// Catalog reconciliation.
    pub mapping: Duration,
}

/// Polls one server per call to [`collect`](Self::collect).
pub struct Collector<P: ProbeExecutor> {
    probe: P,
    host: String,
    port: u16,
    checked: bool,
    last_timing: Option<CollectorTiming>,
}

impl<P: ProbeExecutor> Collector<P> {
    /// Creates a collector polling `host:port` through `probe`.
    pub fn new(probe: P, host: impl Into<String>, port: u16) -> Self {
        Self {
            probe,
            host: host.into(),
            port,
            checked: false,
            last_timing: None,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Returns timing information from the last `collect` call.
    pub fn last_timing(&self) -> Option<&CollectorTiming> {
        self.last_timing.as_ref()
    }

    /// Runs both commands and returns the raw sample for this cycle.
    ///
    /// Host and port are injected first, then the statistics lines, then the
    /// liveness status. A failed command only leaves its part out.
    pub fn collect_raw(&mut self) -> RawSample {
        let start = Instant::now();
        let mut timing = CollectorTiming::default();
        let sample = self.collect_raw_timed(&mut timing);
        timing.total = start.elapsed();
        self.last_timing = Some(timing);
        sample
    }

    fn collect_raw_timed(&mut self, timing: &mut CollectorTiming) -> RawSample {
        if !self.checked {
            self.probe.check();
            self.checked = true;
        }

        let mut sample = RawSample::new();
        sample.insert(HOST_KEY.to_string(), Value::from(self.host.as_str()));
        sample.insert(PORT_KEY.to_string(), Value::from(self.port.to_string()));

        let start = Instant::now();
        let stats = self.probe.run(STATS_COMMAND, &self.host, self.port);
        let parsed = parse_response(&stats);
        debug!("{}: {} raw values", STATS_COMMAND, parsed.len());
        sample.extend(parsed);
        timing.stats = start.elapsed();

        let start = Instant::now();
        let health = self.probe.run(HEALTH_COMMAND, &self.host, self.port);
        let status = health_status(&health);
        trace!("{}: '{}' -> status {}", HEALTH_COMMAND, health.trim(), status);
        sample.insert(STATUS_KEY.to_string(), status);
        timing.health = start.elapsed();

        sample
    }

    /// Collects one cycle and maps it onto the catalog.
    pub fn collect(&mut self) -> Result<CanonicalMetricSet, CollectError> {
        let total_start = Instant::now();
        let mut timing = CollectorTiming::default();

        let sample = self.collect_raw_timed(&mut timing);

        let start = Instant::now();
        let result = populate(&sample, &CATALOG);
        timing.mapping = start.elapsed();
        timing.total = total_start.elapsed();
        self.last_timing = Some(timing);

        result.map_err(CollectError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockProbe;
    use crate::metrics::SemanticType;

    #[test]
    fn test_collect_leader() {
        let mut collector = Collector::new(MockProbe::leader(), "zk1", 2181);
        let set = collector.collect().unwrap();

        assert_eq!(set.len(), CATALOG.len());
        assert_eq!(set.get("status").unwrap().value, Value::Integer(1));
        assert_eq!(set.get("followers").unwrap().value, Value::Integer(2));
        assert_eq!(set.get("max_latency").unwrap().value, Value::Integer(15));

        let state = set.get("server_state").unwrap();
        assert_eq!(state.value, Value::from("leader"));
        assert_eq!(state.semantic_type, SemanticType::Attribute);
        assert_eq!(set.get("zk_host").unwrap().value, Value::from("zk1"));
        assert_eq!(set.get("zk_port").unwrap().value, Value::from("2181"));
        assert!(set.get("version").is_none());
    }

    #[test]
    fn test_collect_follower_skips_leader_only_metrics() {
        let mut collector = Collector::new(MockProbe::follower(), "zk2", 2181);
        let set = collector.collect().unwrap();

        assert!(set.get("followers").is_none());
        assert!(set.get("synced_followers").is_none());
        assert!(set.get("pending_syncs").is_none());
        assert_eq!(set.get("server_state").unwrap().value, Value::from("follower"));
        assert_eq!(set.len(), CATALOG.len() - 3);
    }

    #[test]
    fn test_collect_sends_commands_in_order() {
        let probe = MockProbe::leader();
        let mut collector = Collector::new(&probe, "zk1", 2182);
        collector.collect().unwrap();
        collector.collect().unwrap();

        assert_eq!(
            probe.calls(),
            vec![
                "mntr zk1:2182",
                "ruok zk1:2182",
                "mntr zk1:2182",
                "ruok zk1:2182"
            ]
        );
        assert_eq!(probe.checks(), 1);
    }

    #[test]
    fn test_collect_liveness_failure_keeps_stats() {
        let probe = MockProbe::new().with_response("mntr", crate::collector::mock::LEADER_MNTR);
        let mut collector = Collector::new(probe, "zk1", 2181);
        let set = collector.collect().unwrap();

        assert_eq!(set.get("status").unwrap().value, Value::Integer(0));
        assert_eq!(set.get("znode_count").unwrap().value, Value::Integer(52));
    }

    #[test]
    fn test_collect_server_down_still_reports_context() {
        // Host, port and status are always present, so a dead server still
        // yields a minimal set with status 0.
        let mut collector = Collector::new(MockProbe::new(), "zk1", 2181);
        let set = collector.collect().unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(set.get("status").unwrap().value, Value::Integer(0));
    }

    #[test]
    fn test_collect_is_idempotent() {
        let mut collector = Collector::new(MockProbe::leader(), "zk1", 2181);
        let first = collector.collect().unwrap();
        let second = collector.collect().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_collect_raw_contains_context() {
        let mut collector = Collector::new(MockProbe::leader(), "zk1", 2181);
        let raw = collector.collect_raw();

        assert_eq!(raw.get("zk_host"), Some(&Value::from("zk1")));
        assert_eq!(raw.get("zk_port"), Some(&Value::from("2181")));
        assert_eq!(raw.get("status"), Some(&Value::Integer(1)));
        assert_eq!(
            raw.get("zk_version"),
            Some(&Value::from("3.4.6-1569965,"))
        );
        assert!(collector.last_timing().is_some());
    }

    #[test]
    fn test_collect_records_timing() {
        let mut collector = Collector::new(MockProbe::leader(), "zk1", 2181);
        assert!(collector.last_timing().is_none());
        collector.collect().unwrap();
        let timing = collector.last_timing().unwrap();
        assert!(timing.total >= timing.mapping);
    }
}

//! In-memory probe for testing collectors without a running server.
//!
//! `MockProbe` answers commands from a table of canned responses and
//! records every call, so tests can drive the full pipeline and check what
//! was sent.

use std::collections::HashMap;
use std::sync::Mutex;

use super::traits::ProbeExecutor;

/// `mntr` output of a three-node ensemble leader.
pub const LEADER_MNTR: &str = "\
zk_version\t3.4.6-1569965, built on 02/20/2014 09:09 GMT
zk_avg_latency\t0
zk_max_latency\t15
zk_min_latency\t0
zk_packets_received\t1375
zk_packets_sent\t1374
zk_num_alive_connections\t2
zk_outstanding_requests\t0
zk_server_state\tleader
zk_znode_count\t52
zk_watch_count\t3
zk_ephemerals_count\t1
zk_approximate_data_size\t1420
zk_open_file_descriptor_count\t29
zk_max_file_descriptor_count\t4096
zk_followers\t2
zk_synced_followers\t2
zk_pending_syncs\t0
";

/// `mntr` output of a follower: no `zk_followers`/`zk_synced_followers`/`zk_pending_syncs`.
pub const FOLLOWER_MNTR: &str = "\
zk_version\t3.4.6-1569965, built on 02/20/2014 09:09 GMT
zk_avg_latency\t1
zk_max_latency\t22
zk_min_latency\t0
zk_packets_received\t880
zk_packets_sent\t879
zk_num_alive_connections\t1
zk_outstanding_requests\t0
zk_server_state\tfollower
zk_znode_count\t52
zk_watch_count\t0
zk_ephemerals_count\t1
zk_approximate_data_size\t1420
zk_open_file_descriptor_count\t27
zk_max_file_descriptor_count\t4096
";

/// Probe that answers from canned responses.
///
/// Commands without a response get an empty string, which is exactly what
/// the real runner returns when the probe fails.
#[derive(Debug, Default)]
pub struct MockProbe {
    responses: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
    checks: Mutex<usize>,
}

impl MockProbe {
    /// Creates a probe that answers nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the response for `command`.
    pub fn with_response(mut self, command: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses.insert(command.into(), response.into());
        self
    }

    /// A healthy leader.
    pub fn leader() -> Self {
        Self::new()
            .with_response("mntr", LEADER_MNTR)
            .with_response("ruok", "imok")
    }

    /// A healthy follower.
    pub fn follower() -> Self {
        Self::new()
            .with_response("mntr", FOLLOWER_MNTR)
            .with_response("ruok", "imok")
    }

    /// Commands received so far, as `command host:port`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of times `check` was called.
    pub fn checks(&self) -> usize {
        self.checks.lock().map(|c| *c).unwrap_or(0)
    }
}

impl ProbeExecutor for MockProbe {
    fn run(&self, command: &str, host: &str, port: u16) -> String {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(format!("{} {}:{}", command, host, port));
        }
        self.responses.get(command).cloned().unwrap_or_default()
    }

    fn check(&self) {
        if let Ok(mut checks) = self.checks.lock() {
            *checks += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_probe_responses() {
        let probe = MockProbe::new().with_response("ruok", "imok");
        assert_eq!(probe.run("ruok", "localhost", 2181), "imok");
        assert_eq!(probe.run("mntr", "localhost", 2181), "");
        assert_eq!(
            probe.calls(),
            vec!["ruok localhost:2181", "mntr localhost:2181"]
        );
    }

    #[test]
    fn test_mock_probe_counts_checks() {
        let probe = MockProbe::leader();
        probe.check();
        probe.check();
        assert_eq!(probe.checks(), 2);
    }
}

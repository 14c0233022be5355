//! Metrics collector for ZooKeeper-style four-letter-word endpoints.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Collector                         │
//! │   mntr ──▶ parse_response ─┐                             │
//! │   ruok ──▶ health_status ──┼──▶ RawSample ──▶ populate   │
//! │   host/port ───────────────┘                    │        │
//! │                                                 ▼        │
//! │                                      CanonicalMetricSet  │
//! │                  ┌───────────────┐                       │
//! │                  │ ProbeExecutor │ (trait)               │
//! │                  └───────┬───────┘                       │
//! └──────────────────────────┼───────────────────────────────┘
//!                  ┌─────────┴─────────┐
//!           ┌──────▼──────┐     ┌──────▼──────┐
//!           │ ProbeRunner │     │  MockProbe  │
//!           │ (nc, ...)   │     │  (Testing)  │
//!           └─────────────┘     └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use zkmon_core::collector::{Collector, ProbeRunner};
//!
//! let probe = ProbeRunner::new("nc");
//! let mut collector = Collector::new(probe, "localhost", 2181);
//! let metrics = collector.collect().unwrap();
//! ```
//!
//! ```
//! use zkmon_core::collector::{Collector, MockProbe};
//!
//! let mut collector = Collector::new(MockProbe::leader(), "localhost", 2181);
//! let metrics = collector.collect().unwrap();
//! assert!(metrics.get("znode_count").is_some());
//! ```

#[allow(clippy::module_inception)]
mod collector;
pub mod mock;
pub mod parser;
pub mod probe;
pub mod traits;

pub use collector::{CollectError, Collector, CollectorTiming, HEALTH_COMMAND, STATS_COMMAND};
pub use mock::MockProbe;
pub use parser::{coerce_value, health_status, is_alive, parse_response};
pub use probe::{DEFAULT_TIMEOUT, ProbeError, ProbeRunner, find_executable};
pub use traits::ProbeExecutor;

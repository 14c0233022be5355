//! zkmon-core — collection pipeline for ZooKeeper-style admin endpoints.
//!
//! Provides:
//! - `collector` — probe invocation, response parsing, the collection cycle
//! - `metrics` — the metric catalog and raw-to-canonical reconciliation
//! - `model` — typed values, raw samples and canonical metric sets

pub mod collector;
pub mod metrics;
pub mod model;

//! WickScan Core: candle model, structure analysis, wickless signals, setup lifecycle.
//!
//! This crate contains the engine:
//! - Domain types (candles, swing points, setups, signals, instruments)
//! - Swing point detection and trend classification
//! - Wickless signal-candle detection
//! - Structure-anchored setup calculation with 1:1 reward-to-risk
//! - Retracement monitor (WAITING → TRIGGERED / EXPIRED)
//! - Outcome evaluator (open → WIN / LOSS)
//! - Scan orchestrator composing the detection pipeline
//!
//! Everything here is synchronous and free of I/O. Persistence and data
//! retrieval live in `wickscan-runner`.

pub mod analysis;
pub mod config;
pub mod domain;
pub mod ids;
pub mod lifecycle;
pub mod scan;
pub mod sizing;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{ConfigError, RiskBand, StrategyConfig};
pub use scan::{scan_series, ScanResult};

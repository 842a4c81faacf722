//! Strategy constants shared by every instrument.
//!
//! Loaded from the `[strategy]` table of a TOML file. Every field has a
//! default, so an empty table yields the standard rule set.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::lifecycle::OutcomePriority;

/// Swing lookback used when none is configured.
pub const DEFAULT_SWING_LOOKBACK: usize = 3;
/// Candles a setup may wait for a retracement before expiring.
pub const DEFAULT_MAX_CANDLES_FOR_ENTRY: u32 = 10;
/// Minimum swing points before a trend can be anything but ranging.
pub const DEFAULT_MIN_SWING_POINTS: usize = 4;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Acceptable risk distance, in pips, for a setup to be traded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskBand {
    pub min_pips: f64,
    pub max_pips: f64,
}

impl Default for RiskBand {
    fn default() -> Self {
        Self {
            min_pips: 3.0,
            max_pips: 100.0,
        }
    }
}

impl RiskBand {
    pub fn contains(&self, pips: f64) -> bool {
        pips >= self.min_pips && pips <= self.max_pips
    }
}

/// Rule-set constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub swing_lookback: usize,
    pub max_candles_for_entry: u32,
    pub min_swing_points: usize,
    pub risk_band: RiskBand,
    pub outcome_priority: OutcomePriority,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            swing_lookback: DEFAULT_SWING_LOOKBACK,
            max_candles_for_entry: DEFAULT_MAX_CANDLES_FOR_ENTRY,
            min_swing_points: DEFAULT_MIN_SWING_POINTS,
            risk_band: RiskBand::default(),
            outcome_priority: OutcomePriority::default(),
        }
    }
}

impl StrategyConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Smallest candle count that can produce a swing point.
    pub fn min_candles(&self) -> usize {
        2 * self.swing_lookback + 1
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.swing_lookback == 0 {
            return Err(ConfigError::Invalid("swing_lookback must be at least 1".into()));
        }
        if self.max_candles_for_entry == 0 {
            return Err(ConfigError::Invalid(
                "max_candles_for_entry must be at least 1".into(),
            ));
        }
        let band = self.risk_band;
        if !(band.min_pips.is_finite() && band.max_pips.is_finite()) {
            return Err(ConfigError::Invalid("risk_band must be finite".into()));
        }
        if band.min_pips < 0.0 || band.min_pips > band.max_pips {
            return Err(ConfigError::Invalid(format!(
                "risk_band [{}, {}] is not a valid range",
                band.min_pips, band.max_pips
            )));
        }
        Ok(())
    }
}

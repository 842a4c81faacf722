//! Scanner configuration: which instruments, which timeframes, which rules.
//!
//! Loaded from a TOML file such as:
//!
//! ```toml
//! timeframes = ["H1", "H4"]
//! ids = "CONTENT"
//!
//! [strategy]
//! swing_lookback = 3
//! max_candles_for_entry = 10
//!
//! [[instruments]]
//! pair = "EUR_USD"
//!
//! [[instruments]]
//! pair = "USD_JPY"
//! stop_buffer = 0.03
//! ```
//!
//! Instrument parameters left out of the file fall back to the FX preset for
//! the pair (see [`InstrumentConfig::forex`]).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use wickscan_core::domain::{InstrumentConfig, InstrumentError, Timeframe};
use wickscan_core::ids::{ContentIdGenerator, IdGenerator, SeededIdGenerator, SequentialIdGenerator};
use wickscan_core::StrategyConfig;

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

    #[error(transparent)]
    Strategy(#[from] wickscan_core::ConfigError),

    #[error(transparent)]
    Instrument(#[from] InstrumentError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One `[[instruments]]` entry. Missing fields use the FX preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentEntry {
    pub pair: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_buffer: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pip_multiplier: Option<f64>,
}

impl InstrumentEntry {
    pub fn new(pair: impl Into<String>) -> Self {
        Self {
            pair: pair.into(),
            tolerance: None,
            stop_buffer: None,
            pip_multiplier: None,
        }
    }

    /// Overlay the explicit fields on the preset for this pair.
    pub fn resolve(&self) -> InstrumentConfig {
        let preset = InstrumentConfig::forex(self.pair.trim());
        InstrumentConfig {
            tolerance: self.tolerance.unwrap_or(preset.tolerance),
            stop_buffer: self.stop_buffer.unwrap_or(preset.stop_buffer),
            pip_multiplier: self.pip_multiplier.unwrap_or(preset.pip_multiplier),
            ..preset
        }
    }
}

/// How setup and signal ids are generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdScheme {
    /// Hash of `(pair, timeframe, signal time)`; stable across runs.
    #[default]
    Content,
    /// `setup-1`, `setup-2`, ... per process.
    Sequential,
    /// Random hex ids, reproducible when `id_seed` is set.
    Random,
}

/// Everything the scanner needs besides its collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub strategy: StrategyConfig,
    pub timeframes: Vec<Timeframe>,
    pub instruments: Vec<InstrumentEntry>,
    pub ids: IdScheme,
    pub id_seed: Option<u64>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyConfig::default(),
            timeframes: vec![Timeframe::H1],
            instruments: Vec::new(),
            ids: IdScheme::default(),
            id_seed: None,
        }
    }
}

impl ScannerConfig {
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

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy.validate()?;

        if self.timeframes.is_empty() {
            return Err(ConfigError::Invalid("at least one timeframe is required".into()));
        }
        if self.instruments.is_empty() {
            return Err(ConfigError::Invalid("at least one instrument is required".into()));
        }

        let mut seen = HashSet::new();
        for entry in &self.instruments {
            let instrument = entry.resolve();
            instrument.validate()?;
            if !seen.insert(instrument.pair.to_ascii_uppercase()) {
                return Err(ConfigError::Invalid(format!(
                    "instrument '{}' is listed more than once",
                    instrument.pair
                )));
            }
        }
        Ok(())
    }

    /// Resolved parameters for every configured instrument.
    pub fn resolved_instruments(&self) -> Vec<InstrumentConfig> {
        self.instruments.iter().map(InstrumentEntry::resolve).collect()
    }

    /// Every (instrument, timeframe) combination, instruments outermost.
    pub fn jobs(&self) -> Vec<(InstrumentConfig, Timeframe)> {
        let mut timeframes = self.timeframes.clone();
        timeframes.sort();
        timeframes.dedup();

        self.resolved_instruments()
            .into_iter()
            .flat_map(|instrument| {
                timeframes
                    .iter()
                    .map(move |&tf| (instrument.clone(), tf))
            })
            .collect()
    }

    pub fn id_generator(&self) -> Arc<dyn IdGenerator> {
        match (self.ids, self.id_seed) {
            (IdScheme::Content, _) => Arc::new(ContentIdGenerator),
            (IdScheme::Sequential, _) => Arc::new(SequentialIdGenerator::new()),
            (IdScheme::Random, Some(seed)) => Arc::new(SeededIdGenerator::new(seed)),
            (IdScheme::Random, None) => Arc::new(SeededIdGenerator::from_entropy()),
        }
    }
}

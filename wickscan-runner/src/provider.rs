//! Candle providers and structured error types.
//!
//! The CandleProvider trait abstracts over where candles come from (CSV files
//! on disk, an in-memory fixture, a broker feed) so the scanner can be driven
//! the same way in production and in tests.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use thiserror::Error;
use wickscan_core::domain::{Candle, Timeframe};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no candle data for {pair} {timeframe}")]
    NotFound { pair: String, timeframe: Timeframe },

    #[error("candle file '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("candle file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Source of oldest-first candles per (pair, timeframe).
///
/// The final candle may be incomplete; every earlier one must be complete.
pub trait CandleProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn fetch(&self, pair: &str, timeframe: Timeframe) -> Result<Vec<Candle>, ProviderError>;
}

// ── CSV ──────────────────────────────────────────────────────────────

/// Reads `<dir>/<PAIR>_<TF>.csv` with header `time,open,high,low,close,complete`.
///
/// `time` is RFC 3339 (e.g. `2024-05-06T13:00:00Z`). A `/` in the pair name
/// is written as `_`.
#[derive(Debug, Clone)]
pub struct CsvCandleProvider {
    dir: PathBuf,
}

impl CsvCandleProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, pair: &str, timeframe: Timeframe) -> PathBuf {
        let pair = pair.trim().replace('/', "_").to_ascii_uppercase();
        self.dir.join(format!("{pair}_{timeframe}.csv"))
    }

    /// Write `candles` to the file for (pair, timeframe), replacing it.
    pub fn write(
        &self,
        pair: &str,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> Result<PathBuf, ProviderError> {
        let path = self.path_for(pair, timeframe);
        let display = path.display().to_string();
        fs::create_dir_all(&self.dir).map_err(|source| ProviderError::Io {
            path: self.dir.display().to_string(),
            source,
        })?;

        let csv_err = |source| ProviderError::Csv {
            path: display.clone(),
            source,
        };
        let mut writer = csv::Writer::from_path(&path).map_err(csv_err)?;
        for candle in candles {
            writer.serialize(candle).map_err(csv_err)?;
        }
        writer.flush().map_err(|source| ProviderError::Io {
            path: display.clone(),
            source,
        })?;
        Ok(path)
    }
}

impl CandleProvider for CsvCandleProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, pair: &str, timeframe: Timeframe) -> Result<Vec<Candle>, ProviderError> {
        let path = self.path_for(pair, timeframe);
        if !path.exists() {
            return Err(ProviderError::NotFound {
                pair: pair.to_string(),
                timeframe,
            });
        }

        let display = path.display().to_string();
        let mut reader = csv::Reader::from_path(&path).map_err(|source| ProviderError::Csv {
            path: display.clone(),
            source,
        })?;
        reader
            .deserialize::<Candle>()
            .map(|row| {
                row.map_err(|source| ProviderError::Csv {
                    path: display.clone(),
                    source,
                })
            })
            .collect()
    }
}

// ── In-memory ────────────────────────────────────────────────────────

/// Fixed candle data keyed by (pair, timeframe).
#[derive(Debug, Default)]
pub struct MemoryCandleProvider {
    series: RwLock<HashMap<(String, Timeframe), Vec<Candle>>>,
}

impl MemoryCandleProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the candles for (pair, timeframe).
    pub fn insert(&self, pair: impl Into<String>, timeframe: Timeframe, candles: Vec<Candle>) {
        let mut series = self.series.write().unwrap_or_else(|e| e.into_inner());
        series.insert((pair.into(), timeframe), candles);
    }

    /// Append candles, as if time had moved on.
    pub fn extend(&self, pair: &str, timeframe: Timeframe, candles: impl IntoIterator<Item = Candle>) {
        let mut series = self.series.write().unwrap_or_else(|e| e.into_inner());
        series
            .entry((pair.to_string(), timeframe))
            .or_default()
            .extend(candles);
    }
}

impl CandleProvider for MemoryCandleProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(&self, pair: &str, timeframe: Timeframe) -> Result<Vec<Candle>, ProviderError> {
        let series = self.series.read().unwrap_or_else(|e| e.into_inner());
        series
            .get(&(pair.to_string(), timeframe))
            .cloned()
            .ok_or_else(|| ProviderError::NotFound {
                pair: pair.to_string(),
                timeframe,
            })
    }
}

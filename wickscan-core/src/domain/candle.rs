//! Candles and the validated series built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLC candle for a single instrument on a single timeframe.
///
/// `complete` is false only for the candle that is still forming. Structure and
/// trigger decisions never look at an incomplete candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub complete: bool,
}

impl Candle {
    /// Absolute body size, `|close - open|`.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Returns true if any OHLC field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        ![self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Check the OHLC fields are finite and internally consistent.
    pub fn validate(&self) -> Result<(), CandleError> {
        if self.is_void() {
            return Err(CandleError::NonFinite { time: self.time });
        }
        if self.high < self.low {
            return Err(CandleError::HighBelowLow {
                time: self.time,
                high: self.high,
                low: self.low,
            });
        }
        for (field, value) in [("open", self.open), ("close", self.close)] {
            if value > self.high || value < self.low {
                return Err(CandleError::OutsideRange {
                    time: self.time,
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Malformed candle input. These are the only loud failures in the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandleError {
    #[error("candle at {time} has a non-finite OHLC field")]
    NonFinite { time: DateTime<Utc> },

    #[error("candle at {time}: high {high} is below low {low}")]
    HighBelowLow {
        time: DateTime<Utc>,
        high: f64,
        low: f64,
    },

    #[error("candle at {time}: {field} {value} lies outside the high/low range")]
    OutsideRange {
        time: DateTime<Utc>,
        field: &'static str,
        value: f64,
    },

    #[error("candle at {time} is not after the previous candle at {previous}")]
    OutOfOrder {
        time: DateTime<Utc>,
        previous: DateTime<Utc>,
    },

    #[error("incomplete candle at {time} is not the most recent candle")]
    IncompleteNotLast { time: DateTime<Utc> },
}

/// Immutable, oldest-first candle sequence.
///
/// Construction validates every candle, strict time ordering, and that an
/// incomplete candle can only be the last element.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>) -> Result<Self, CandleError> {
        let last = candles.len().saturating_sub(1);
        for (i, candle) in candles.iter().enumerate() {
            candle.validate()?;
            if i > 0 && candle.time <= candles[i - 1].time {
                return Err(CandleError::OutOfOrder {
                    time: candle.time,
                    previous: candles[i - 1].time,
                });
            }
            if !candle.complete && i != last {
                return Err(CandleError::IncompleteNotLast { time: candle.time });
            }
        }
        Ok(Self { candles })
    }

    /// The complete prefix of the series.
    pub fn complete(&self) -> &[Candle] {
        match self.candles.last() {
            Some(c) if !c.complete => &self.candles[..self.candles.len() - 1],
            _ => &self.candles,
        }
    }

    pub fn last_complete(&self) -> Option<&Candle> {
        self.complete().last()
    }

    /// Complete candles strictly after `time`, oldest first.
    pub fn complete_after(&self, time: DateTime<Utc>) -> &[Candle] {
        let complete = self.complete();
        let start = complete.partition_point(|c| c.time <= time);
        &complete[start..]
    }
}

impl TryFrom<Vec<Candle>> for CandleSeries {
    type Error = CandleError;

    fn try_from(candles: Vec<Candle>) -> Result<Self, Self::Error> {
        Self::new(candles)
    }
}

//! Wickless signal-candle detection.
//!
//! In an up-trend a bullish candle that opened at (or within `tolerance` of)
//! its low is a BUY trigger; in a down-trend a bearish candle that opened at
//! its high is a SELL trigger. The candle's extreme on the open side becomes
//! the entry zone price must retrace to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Candle, Direction, TrendState};

/// A candle that qualified as an entry trigger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalCandle {
    pub direction: Direction,
    pub time: DateTime<Utc>,
    /// Low of the candle for a buy, high for a sell.
    pub entry_zone: f64,
}

/// Decide whether `candle` is a wickless trigger for `trend`.
///
/// `tolerance` is an absolute price distance. It bounds the wick on the open
/// side and is also the minimum body size (smaller bodies are dojis).
pub fn detect_signal_candle(
    candle: &Candle,
    trend: TrendState,
    tolerance: f64,
) -> Option<SignalCandle> {
    let direction = trend.allowed_direction()?;
    if !candle.complete || candle.body() < tolerance {
        return None;
    }

    let entry_zone = match direction {
        Direction::Buy if candle.is_bullish() && candle.low >= candle.open - tolerance => {
            candle.low
        }
        Direction::Sell if candle.is_bearish() && candle.high <= candle.open + tolerance => {
            candle.high
        }
        _ => return None,
    };

    Some(SignalCandle {
        direction,
        time: candle.time,
        entry_zone,
    })
}

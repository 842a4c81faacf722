//! Trade setups: the computed levels and the persisted lifecycle entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Direction, SetupId, SwingPoint, Timeframe};

/// Entry, stop and target levels derived from structure and a signal candle.
///
/// For a buy `stop_loss < entry_zone < take_profit`; for a sell the order is
/// reversed. The target sits exactly `risk_distance` from the entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeSetup {
    pub direction: Direction,
    pub entry_zone: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub risk_distance: f64,
    pub structure_point: SwingPoint,
}

impl TradeSetup {
    pub fn reward_distance(&self) -> f64 {
        (self.take_profit - self.entry_zone).abs()
    }

    /// True when the entry sits strictly between stop and target on the correct sides.
    pub fn is_ordered(&self) -> bool {
        match self.direction {
            Direction::Buy => self.stop_loss < self.entry_zone && self.entry_zone < self.take_profit,
            Direction::Sell => {
                self.take_profit < self.entry_zone && self.entry_zone < self.stop_loss
            }
        }
    }
}

/// Lifecycle status of a pending setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SetupStatus {
    Waiting,
    Triggered,
    Expired,
}

impl SetupStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SetupStatus::Waiting)
    }
}

impl fmt::Display for SetupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupStatus::Waiting => write!(f, "WAITING"),
            SetupStatus::Triggered => write!(f, "TRIGGERED"),
            SetupStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// A setup waiting for price to retrace into its entry zone.
///
/// Identity is `(pair, signal_candle_time)`. Only the retracement monitor
/// mutates `candles_elapsed`, `status` and `observed_through`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSetup {
    pub id: SetupId,
    pub pair: String,
    pub timeframe: Timeframe,
    pub signal_candle_time: DateTime<Utc>,
    #[serde(flatten)]
    pub setup: TradeSetup,
    pub candles_elapsed: u32,
    pub status: SetupStatus,
    /// Time of the last candle applied by the monitor.
    pub observed_through: Option<DateTime<Utc>>,
}

impl ActiveSetup {
    pub fn new(
        id: SetupId,
        pair: impl Into<String>,
        timeframe: Timeframe,
        signal_candle_time: DateTime<Utc>,
        setup: TradeSetup,
    ) -> Self {
        Self {
            id,
            pair: pair.into(),
            timeframe,
            signal_candle_time,
            setup,
            candles_elapsed: 0,
            status: SetupStatus::Waiting,
            observed_through: None,
        }
    }

    /// Deduplication key.
    pub fn key(&self) -> (&str, DateTime<Utc>) {
        (&self.pair, self.signal_candle_time)
    }

    /// Candles at or before this time have already been seen.
    pub fn watermark(&self) -> DateTime<Utc> {
        self.observed_through
            .map_or(self.signal_candle_time, |t| t.max(self.signal_candle_time))
    }
}

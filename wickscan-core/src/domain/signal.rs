//! Triggered signals and their outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ActiveSetup, Direction, SetupId, SetupStatus, SignalId, Timeframe};

/// Resolution of a triggered signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Win,
    Loss,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => write!(f, "WIN"),
            Outcome::Loss => write!(f, "LOSS"),
        }
    }
}

/// A filled setup with frozen levels.
///
/// Created once when its setup triggers. `outcome` is written once by the
/// outcome evaluator and never reverted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: SignalId,
    pub setup_id: SetupId,
    pub pair: String,
    pub timeframe: Timeframe,
    pub direction: Direction,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Time of the candle that retraced into the entry zone.
    pub triggered_at: DateTime<Utc>,
    pub outcome: Option<Outcome>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// Time of the last candle checked for an outcome.
    pub observed_through: DateTime<Utc>,
}

impl Signal {
    /// Freeze a triggered setup into a signal.
    ///
    /// Returns `None` unless the setup is `TRIGGERED`.
    pub fn from_triggered(id: SignalId, setup: &ActiveSetup) -> Option<Self> {
        if setup.status != SetupStatus::Triggered {
            return None;
        }
        let triggered_at = setup.observed_through?;
        Some(Self {
            id,
            setup_id: setup.id.clone(),
            pair: setup.pair.clone(),
            timeframe: setup.timeframe,
            direction: setup.setup.direction,
            entry: setup.setup.entry_zone,
            stop_loss: setup.setup.stop_loss,
            take_profit: setup.setup.take_profit,
            triggered_at,
            outcome: None,
            resolved_at: None,
            observed_through: triggered_at,
        })
    }

    pub fn is_open(&self) -> bool {
        self.outcome.is_none()
    }
}

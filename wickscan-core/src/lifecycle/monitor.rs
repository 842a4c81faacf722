//! Retracement monitor: advances WAITING setups one complete candle at a time.
//!
//! Per applied candle:
//! 1. `candles_elapsed += 1`
//! 2. Trigger check (buy: low <= entry, sell: high >= entry)
//! 3. Expiry check (`candles_elapsed >= max_candles`)
//!
//! The trigger check runs first, so a retracement on the final allowed candle
//! still fills. Terminal setups and already-seen candles are no-ops.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ActiveSetup, Candle, Direction, SetupStatus, TradeSetup};

/// What applying one candle did to a setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorStep {
    /// The setup was already TRIGGERED or EXPIRED.
    AlreadyResolved,
    /// The candle was incomplete or not newer than the last one applied.
    Skipped,
    Waiting { candles_elapsed: u32 },
    Triggered { candles_elapsed: u32 },
    Expired { candles_elapsed: u32 },
}

impl MonitorStep {
    pub fn is_transition(self) -> bool {
        matches!(self, MonitorStep::Triggered { .. } | MonitorStep::Expired { .. })
    }
}

/// Does `candle` reach the entry zone of `setup`?
pub fn retraces_into(setup: &TradeSetup, candle: &Candle) -> bool {
    match setup.direction {
        Direction::Buy => candle.low <= setup.entry_zone,
        Direction::Sell => candle.high >= setup.entry_zone,
    }
}

/// Apply one candle to a setup.
pub fn advance_setup(setup: &mut ActiveSetup, candle: &Candle, max_candles: u32) -> MonitorStep {
    if setup.status.is_terminal() {
        return MonitorStep::AlreadyResolved;
    }
    if !candle.complete || candle.time <= setup.watermark() {
        return MonitorStep::Skipped;
    }

    setup.candles_elapsed += 1;
    setup.observed_through = Some(candle.time);
    let candles_elapsed = setup.candles_elapsed;

    if retraces_into(&setup.setup, candle) {
        setup.status = SetupStatus::Triggered;
        debug!(setup = %setup.id, pair = %setup.pair, candles_elapsed, "setup triggered");
        return MonitorStep::Triggered { candles_elapsed };
    }

    if candles_elapsed >= max_candles {
        setup.status = SetupStatus::Expired;
        debug!(setup = %setup.id, pair = %setup.pair, candles_elapsed, "setup expired");
        return MonitorStep::Expired { candles_elapsed };
    }

    MonitorStep::Waiting { candles_elapsed }
}

/// Summary of feeding a candle slice to one setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorReport {
    /// Candles that incremented the counter.
    pub applied: u32,
    pub last: MonitorStep,
}

/// Feed `candles` in order, stopping at the first terminal transition.
pub fn advance_setup_many(
    setup: &mut ActiveSetup,
    candles: &[Candle],
    max_candles: u32,
) -> MonitorReport {
    let mut report = MonitorReport {
        applied: 0,
        last: if setup.status.is_terminal() {
            MonitorStep::AlreadyResolved
        } else {
            MonitorStep::Skipped
        },
    };

    for candle in candles {
        let step = advance_setup(setup, candle, max_candles);
        match step {
            MonitorStep::AlreadyResolved => break,
            MonitorStep::Skipped => continue,
            _ => {
                report.applied += 1;
                report.last = step;
            }
        }
        if step.is_transition() {
            break;
        }
    }
    report
}

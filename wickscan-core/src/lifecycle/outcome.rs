//! Outcome evaluation: resolves an open signal to WIN or LOSS.
//!
//! A single candle can reach both the target and the stop. OHLC data cannot
//! say which came first, so the order is a policy: `TargetFirst` (the
//! default, optimistic) or `StopFirst` (conservative). The optimistic default
//! is a modelling assumption and may not match intrabar reality.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Candle, Direction, Outcome, Signal};

/// Which level wins when one candle reaches both target and stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomePriority {
    /// Check the target first: a two-sided candle is a WIN.
    #[default]
    TargetFirst,
    /// Check the stop first: a two-sided candle is a LOSS.
    StopFirst,
}

/// Evaluate one candle against frozen stop/target levels.
///
/// Returns `None` while neither level has been reached.
pub fn check_outcome(
    direction: Direction,
    stop_loss: f64,
    take_profit: f64,
    candle: &Candle,
    priority: OutcomePriority,
) -> Option<Outcome> {
    let (target_hit, stop_hit) = match direction {
        Direction::Buy => (candle.high >= take_profit, candle.low <= stop_loss),
        Direction::Sell => (candle.low <= take_profit, candle.high >= stop_loss),
    };

    match priority {
        OutcomePriority::TargetFirst if target_hit => Some(Outcome::Win),
        OutcomePriority::TargetFirst if stop_hit => Some(Outcome::Loss),
        OutcomePriority::StopFirst if stop_hit => Some(Outcome::Loss),
        OutcomePriority::StopFirst if target_hit => Some(Outcome::Win),
        _ => None,
    }
}

/// What applying one candle did to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolveStep {
    AlreadyResolved,
    Skipped,
    Open,
    Resolved { outcome: Outcome },
}

/// Apply one candle to an open signal, writing the outcome at most once.
///
/// Incomplete candles and candles at or before `observed_through` (which
/// starts at the trigger candle) are skipped.
pub fn resolve_signal(signal: &mut Signal, candle: &Candle, priority: OutcomePriority) -> ResolveStep {
    if !signal.is_open() {
        return ResolveStep::AlreadyResolved;
    }
    if !candle.complete || candle.time <= signal.observed_through {
        return ResolveStep::Skipped;
    }

    signal.observed_through = candle.time;
    match check_outcome(
        signal.direction,
        signal.stop_loss,
        signal.take_profit,
        candle,
        priority,
    ) {
        Some(outcome) => {
            signal.outcome = Some(outcome);
            signal.resolved_at = Some(candle.time);
            debug!(signal = %signal.id, pair = %signal.pair, %outcome, "signal resolved");
            ResolveStep::Resolved { outcome }
        }
        None => ResolveStep::Open,
    }
}

/// Feed `candles` in order until the signal resolves.
pub fn resolve_signal_many(
    signal: &mut Signal,
    candles: &[Candle],
    priority: OutcomePriority,
) -> ResolveStep {
    let mut last = if signal.is_open() {
        ResolveStep::Skipped
    } else {
        ResolveStep::AlreadyResolved
    };
    for candle in candles {
        match resolve_signal(signal, candle, priority) {
            ResolveStep::Skipped => continue,
            ResolveStep::AlreadyResolved => break,
            step @ ResolveStep::Resolved { .. } => return step,
            step => last = step,
        }
    }
    last
}

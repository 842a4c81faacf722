//! Trend classification from swing structure.
//!
//! UP needs a higher high AND a higher low; DOWN needs a lower high AND a
//! lower low. Everything else, including too little structure, is RANGING,
//! and RANGING blocks signal generation downstream.

use crate::domain::{SwingKind, SwingPoint, TrendState};

/// Classify the trend from an index-sorted swing sequence.
pub fn classify_trend(swings: &[SwingPoint], min_swing_points: usize) -> TrendState {
    if swings.len() < min_swing_points {
        return TrendState::Ranging;
    }

    let (Some((latest_high, prev_high)), Some((latest_low, prev_low))) = (
        last_two(swings, SwingKind::High),
        last_two(swings, SwingKind::Low),
    ) else {
        return TrendState::Ranging;
    };

    let higher_high = latest_high > prev_high;
    let higher_low = latest_low > prev_low;
    let lower_high = latest_high < prev_high;
    let lower_low = latest_low < prev_low;

    if higher_high && higher_low {
        TrendState::Up
    } else if lower_high && lower_low {
        TrendState::Down
    } else {
        TrendState::Ranging
    }
}

/// Prices of the latest and previous swing of `kind`.
fn last_two(swings: &[SwingPoint], kind: SwingKind) -> Option<(f64, f64)> {
    let mut of_kind = swings.iter().rev().filter(|s| s.kind == kind);
    let latest = of_kind.next()?;
    let previous = of_kind.next()?;
    Some((latest.price, previous.price))
}

//! Swing point detection: local highs and lows used as structure anchors.
//!
//! A candle at index `i` is a swing HIGH when its high is strictly greater
//! than the highs of the `lookback` candles on each side, and a swing LOW when
//! its low is strictly less than their lows. Ties never qualify. The two
//! checks are independent, so an outside candle can be both.

use crate::domain::{Candle, SwingKind, SwingPoint};

/// Find all swing points in `candles`, sorted by index.
///
/// Callers pass complete candles only. Returns an empty vector when there are
/// fewer than `2 * lookback + 1` candles or `lookback` is zero.
pub fn find_swing_points(candles: &[Candle], lookback: usize) -> Vec<SwingPoint> {
    if lookback == 0 || candles.len() < 2 * lookback + 1 {
        return Vec::new();
    }

    let mut swings = Vec::new();
    for i in lookback..candles.len() - lookback {
        let candle = &candles[i];
        let neighbours = candles[i - lookback..i]
            .iter()
            .chain(&candles[i + 1..=i + lookback]);

        let (mut is_high, mut is_low) = (true, true);
        for n in neighbours {
            is_high &= candle.high > n.high;
            is_low &= candle.low < n.low;
            if !is_high && !is_low {
                break;
            }
        }

        if is_high {
            swings.push(SwingPoint {
                index: i,
                time: candle.time,
                price: candle.high,
                kind: SwingKind::High,
            });
        }
        if is_low {
            swings.push(SwingPoint {
                index: i,
                time: candle.time,
                price: candle.low,
                kind: SwingKind::Low,
            });
        }
    }
    swings
}

/// The most recent swing of the given kind.
pub fn latest_swing(swings: &[SwingPoint], kind: SwingKind) -> Option<&SwingPoint> {
    swings.iter().rev().find(|s| s.kind == kind)
}

//! Scan orchestrator: one (pair, timeframe) series in, one verdict out.
//!
//! Chains swing detection → trend classification → signal-candle detection →
//! setup calculation, stopping at the first negative gate. Pure: fetching
//! candles and persisting setups are the caller's concern.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{
    classify_trend, detect_signal_candle, evaluate_setup, find_swing_points, SignalCandle,
    SetupVerdict,
};
use crate::config::StrategyConfig;
use crate::domain::{CandleSeries, InstrumentConfig, TradeSetup, TrendState};

/// Result of scanning one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub trend: TrendState,
    /// Fewer complete candles than a swing window needs.
    pub insufficient_data: bool,
    pub signal_detected: bool,
    pub signal_candle: Option<SignalCandle>,
    /// Present only when a signal candle was detected.
    pub verdict: Option<SetupVerdict>,
}

impl ScanResult {
    fn neutral(trend: TrendState, insufficient_data: bool) -> Self {
        Self {
            trend,
            insufficient_data,
            signal_detected: false,
            signal_candle: None,
            verdict: None,
        }
    }

    /// The setup, if one was produced and passed validation.
    pub fn valid_setup(&self) -> Option<&TradeSetup> {
        self.verdict.as_ref().and_then(SetupVerdict::valid_setup)
    }
}

/// Scan a candle series for a tradeable setup.
pub fn scan_series(
    series: &CandleSeries,
    instrument: &InstrumentConfig,
    strategy: &StrategyConfig,
) -> ScanResult {
    let candles = series.complete();
    if candles.len() < strategy.min_candles() {
        debug!(
            pair = %instrument.pair,
            candles = candles.len(),
            required = strategy.min_candles(),
            "insufficient data"
        );
        return ScanResult::neutral(TrendState::Ranging, true);
    }

    let swings = find_swing_points(candles, strategy.swing_lookback);
    let trend = classify_trend(&swings, strategy.min_swing_points);
    if trend == TrendState::Ranging {
        debug!(pair = %instrument.pair, swings = swings.len(), "ranging, no signal");
        return ScanResult::neutral(trend, false);
    }

    let Some(signal) = candles
        .last()
        .and_then(|last| detect_signal_candle(last, trend, instrument.tolerance))
    else {
        debug!(pair = %instrument.pair, %trend, "no wickless candle");
        return ScanResult::neutral(trend, false);
    };

    let verdict = evaluate_setup(&signal, &swings, instrument, &strategy.risk_band);
    debug!(pair = %instrument.pair, %trend, direction = %signal.direction, ?verdict, "signal candle");

    ScanResult {
        trend,
        insufficient_data: false,
        signal_detected: true,
        signal_candle: Some(signal),
        verdict: Some(verdict),
    }
}

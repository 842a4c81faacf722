//! Setup calculation: structure-anchored stop, 1:1 target, risk-band validation.
//!
//! The stop sits `stop_buffer` beyond the most recent swing on the losing side
//! (swing LOW for buys, swing HIGH for sells). The target mirrors the stop
//! distance on the winning side, so reward always equals risk.

use serde::{Deserialize, Serialize};

use super::swing::latest_swing;
use super::wickless::SignalCandle;
use crate::config::RiskBand;
use crate::domain::{Direction, InstrumentConfig, SwingKind, SwingPoint, TradeSetup};

/// Outcome of the risk-band and ordering checks. Never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupValidation {
    pub valid: bool,
    pub risk_pips: f64,
    pub reason: Option<String>,
}

/// The three distinct results of turning a signal candle into a setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SetupVerdict {
    /// No swing point exists to anchor the stop.
    NoStructure,
    /// Levels were computed but failed validation.
    Invalid { setup: TradeSetup, reason: String },
    Valid { setup: TradeSetup },
}

impl SetupVerdict {
    pub fn valid_setup(&self) -> Option<&TradeSetup> {
        match self {
            SetupVerdict::Valid { setup } => Some(setup),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, SetupVerdict::Valid { .. })
    }
}

/// Compute entry/stop/target for `direction` from the swing set.
///
/// Returns `None` when no swing of the anchoring kind exists.
pub fn calculate_setup(
    direction: Direction,
    entry_zone: f64,
    swings: &[SwingPoint],
    stop_buffer: f64,
) -> Option<TradeSetup> {
    let anchor_kind = match direction {
        Direction::Buy => SwingKind::Low,
        Direction::Sell => SwingKind::High,
    };
    let anchor = *latest_swing(swings, anchor_kind)?;

    // Stop moves away from the profitable side by the buffer.
    let stop_loss = anchor.price - direction.sign() * stop_buffer;
    let risk_distance = (entry_zone - stop_loss).abs();
    let take_profit = entry_zone + direction.sign() * risk_distance;

    Some(TradeSetup {
        direction,
        entry_zone,
        stop_loss,
        take_profit,
        risk_distance,
        structure_point: anchor,
    })
}

/// Check risk distance against the pip band and the level ordering.
pub fn validate_setup(setup: &TradeSetup, band: &RiskBand, pip_multiplier: f64) -> SetupValidation {
    let risk_pips = setup.risk_distance * pip_multiplier;

    let reason = if !setup.is_ordered() {
        Some(format!(
            "{} entry {} is not strictly between stop {} and target {}",
            setup.direction, setup.entry_zone, setup.stop_loss, setup.take_profit
        ))
    } else if band.contains(risk_pips) {
        None
    } else if risk_pips < band.min_pips {
        Some(format!(
            "risk {risk_pips:.1} pips is below the minimum of {} pips",
            band.min_pips
        ))
    } else {
        Some(format!(
            "risk {risk_pips:.1} pips exceeds the maximum of {} pips",
            band.max_pips
        ))
    };

    SetupValidation {
        valid: reason.is_none(),
        risk_pips,
        reason,
    }
}

/// Calculate and validate a setup for a detected signal candle.
pub fn evaluate_setup(
    signal: &SignalCandle,
    swings: &[SwingPoint],
    instrument: &InstrumentConfig,
    band: &RiskBand,
) -> SetupVerdict {
    let Some(setup) = calculate_setup(
        signal.direction,
        signal.entry_zone,
        swings,
        instrument.stop_buffer,
    ) else {
        return SetupVerdict::NoStructure;
    };

    let validation = validate_setup(&setup, band, instrument.pip_multiplier);
    match validation.reason {
        None => SetupVerdict::Valid { setup },
        Some(reason) => SetupVerdict::Invalid { setup, reason },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const TOL: f64 = 1e-9;

    fn swing(index: usize, kind: SwingKind, price: f64) -> SwingPoint {
        SwingPoint {
            index,
            time: Utc.timestamp_opt(1_700_000_000 + index as i64 * 3600, 0).unwrap(),
            price,
            kind,
        }
    }

    fn band() -> RiskBand {
        RiskBand {
            min_pips: 3.0,
            max_pips: 100.0,
        }
    }

    #[test]
    fn buy_setup_from_swing_low() {
        let swings = vec![
            swing(2, SwingKind::Low, 1.0900),
            swing(5, SwingKind::High, 1.1020),
            swing(8, SwingKind::Low, 1.0950),
        ];
        let setup = calculate_setup(Direction::Buy, 1.0999, &swings, 0.0002).unwrap();
        assert_eq!(setup.structure_point.index, 8);
        assert!((setup.stop_loss - 1.0948).abs() < TOL);
        assert!((setup.risk_distance - 0.0051).abs() < TOL);
        assert!((setup.take_profit - 1.1050).abs() < TOL);
        assert!(setup.is_ordered());
    }

    #[test]
    fn sell_setup_from_swing_high() {
        let swings = vec![
            swing(3, SwingKind::High, 1.2100),
            swing(6, SwingKind::Low, 1.1900),
        ];
        let setup = calculate_setup(Direction::Sell, 1.2050, &swings, 0.0002).unwrap();
        assert!((setup.stop_loss - 1.2102).abs() < TOL);
        assert!((setup.risk_distance - 0.0052).abs() < TOL);
        assert!((setup.take_profit - 1.1998).abs() < TOL);
        assert!(setup.is_ordered());
    }

    #[test]
    fn missing_anchor_yields_none() {
        let swings = vec![swing(3, SwingKind::High, 1.2100)];
        assert!(calculate_setup(Direction::Buy, 1.2050, &swings, 0.0002).is_none());
        assert!(calculate_setup(Direction::Sell, 1.2050, &[], 0.0002).is_none());
    }

    #[test]
    fn reward_equals_risk() {
        let swings = vec![swing(8, SwingKind::Low, 1.0950)];
        let setup = calculate_setup(Direction::Buy, 1.0999, &swings, 0.0002).unwrap();
        assert!((setup.reward_distance() - setup.risk_distance).abs() < 1e-12);
    }

    #[test]
    fn validation_accepts_in_band_risk() {
        let swings = vec![swing(8, SwingKind::Low, 1.0950)];
        let setup = calculate_setup(Direction::Buy, 1.0999, &swings, 0.0002).unwrap();
        let v = validate_setup(&setup, &band(), 10_000.0);
        assert!(v.valid);
        assert!((v.risk_pips - 51.0).abs() < 1e-6);
        assert!(v.reason.is_none());
    }

    #[test]
    fn validation_rejects_tiny_risk() {
        let swings = vec![swing(8, SwingKind::Low, 1.0997)];
        let setup = calculate_setup(Direction::Buy, 1.0999, &swings, 0.00001).unwrap();
        let v = validate_setup(&setup, &band(), 10_000.0);
        assert!(!v.valid);
        assert!(v.reason.unwrap().contains("below the minimum"));
    }

    #[test]
    fn validation_rejects_wide_risk() {
        let swings = vec![swing(8, SwingKind::Low, 1.0800)];
        let setup = calculate_setup(Direction::Buy, 1.0999, &swings, 0.0002).unwrap();
        let v = validate_setup(&setup, &band(), 10_000.0);
        assert!(!v.valid);
        assert!(v.reason.unwrap().contains("exceeds the maximum"));
    }

    #[test]
    fn band_edges_are_inclusive() {
        let at_risk = |risk: f64| TradeSetup {
            direction: Direction::Buy,
            entry_zone: 100.0 + risk,
            stop_loss: 100.0,
            take_profit: 100.0 + 2.0 * risk,
            risk_distance: risk,
            structure_point: swing(1, SwingKind::Low, 100.0),
        };
        assert!(validate_setup(&at_risk(3.0), &band(), 1.0).valid);
        assert!(validate_setup(&at_risk(100.0), &band(), 1.0).valid);
        assert!(!validate_setup(&at_risk(2.5), &band(), 1.0).valid);
        assert!(!validate_setup(&at_risk(100.5), &band(), 1.0).valid);
    }

    #[test]
    fn anchor_above_entry_fails_ordering() {
        // The latest swing low sits above the entry zone, so the stop does too.
        let swings = vec![swing(8, SwingKind::Low, 1.1010)];
        let setup = calculate_setup(Direction::Buy, 1.0999, &swings, 0.0002).unwrap();
        assert!(!setup.is_ordered());
        let v = validate_setup(&setup, &band(), 10_000.0);
        assert!(!v.valid);
        assert!(v.reason.unwrap().contains("not strictly between"));
    }

    #[test]
    fn verdict_distinguishes_three_cases() {
        let instrument = InstrumentConfig::forex("EUR_USD");
        let signal = SignalCandle {
            direction: Direction::Buy,
            time: Utc.timestamp_opt(1_700_100_000, 0).unwrap(),
            entry_zone: 1.0999,
        };

        let verdict = evaluate_setup(&signal, &[], &instrument, &band());
        assert_eq!(verdict, SetupVerdict::NoStructure);

        let wide = vec![swing(8, SwingKind::Low, 1.0800)];
        let verdict = evaluate_setup(&signal, &wide, &instrument, &band());
        assert!(matches!(verdict, SetupVerdict::Invalid { .. }));
        assert!(verdict.valid_setup().is_none());

        let good = vec![swing(8, SwingKind::Low, 1.0950)];
        let verdict = evaluate_setup(&signal, &good, &instrument, &band());
        assert!(verdict.is_valid());
        assert!((verdict.valid_setup().unwrap().take_profit - 1.1050).abs() < TOL);
    }
}

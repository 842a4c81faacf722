//! Position sizing helper
//!
//! Fixed-fractional sizing: lose `balance * risk_fraction` if the stop is hit.
//!
//! # Formula
//! ```text
//! risk_amount = balance * risk_fraction
//! risk_pips   = risk_distance * pip_multiplier
//! units       = risk_amount / (risk_pips * pip_value_per_unit)
//! ```
//!
//! # Example
//! - Balance: 10,000
//! - Risk per trade: 1% (100)
//! - Risk distance: 0.0050 on EUR_USD (50 pips)
//! - Pip value per unit: 0.0001
//! - Units: 100 / (50 * 0.0001) = 20,000

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizingError {
    #[error("{field} must be positive and finite (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    #[error("risk_fraction must be in (0, 1] (got {0})")]
    RiskFractionOutOfRange(f64),
}

/// Units to trade so that a stop-out loses `balance * risk_fraction`.
///
/// The result is floored to whole units.
pub fn position_size(
    balance: f64,
    risk_fraction: f64,
    risk_distance: f64,
    pip_multiplier: f64,
    pip_value_per_unit: f64,
) -> Result<f64, SizingError> {
    for (field, value) in [
        ("balance", balance),
        ("risk_distance", risk_distance),
        ("pip_multiplier", pip_multiplier),
        ("pip_value_per_unit", pip_value_per_unit),
    ] {
        if !(value.is_finite() && value > 0.0) {
            return Err(SizingError::NonPositive { field, value });
        }
    }
    if !(risk_fraction > 0.0 && risk_fraction <= 1.0) {
        return Err(SizingError::RiskFractionOutOfRange(risk_fraction));
    }

    let risk_amount = balance * risk_fraction;
    let risk_pips = risk_distance * pip_multiplier;
    Ok((risk_amount / (risk_pips * pip_value_per_unit)).floor())
}

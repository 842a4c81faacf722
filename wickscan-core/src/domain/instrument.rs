use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-instrument price parameters.
///
/// All three values are absolute price units except `pip_multiplier`, which
/// converts a price distance into pips (10_000 for most FX pairs, 100 for
/// JPY-quoted pairs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub pair: String,
    /// Allowed wick size on the open side of a signal candle, and the minimum body.
    pub tolerance: f64,
    /// Distance placed beyond the structure anchor for the stop.
    pub stop_buffer: f64,
    pub pip_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InstrumentError {
    #[error("instrument '{pair}': {field} must be positive and finite (got {value})")]
    NonPositive {
        pair: String,
        field: &'static str,
        value: f64,
    },

    #[error("instrument pair name is empty")]
    EmptyPair,
}

impl InstrumentConfig {
    pub fn new(pair: impl Into<String>, tolerance: f64, stop_buffer: f64, pip_multiplier: f64) -> Self {
        Self {
            pair: pair.into(),
            tolerance,
            stop_buffer,
            pip_multiplier,
        }
    }

    /// Preset parameters for an FX pair such as `EUR_USD` or `USD/JPY`.
    ///
    /// JPY-quoted pairs price to two decimals, so every parameter is scaled by 100.
    pub fn forex(pair: impl Into<String>) -> Self {
        let pair = pair.into();
        if Self::is_jpy_quoted(&pair) {
            Self::new(pair, 0.002, 0.02, 100.0)
        } else {
            Self::new(pair, 0.00002, 0.0002, 10_000.0)
        }
    }

    fn is_jpy_quoted(pair: &str) -> bool {
        pair.to_ascii_uppercase().ends_with("JPY")
    }

    pub fn validate(&self) -> Result<(), InstrumentError> {
        if self.pair.trim().is_empty() {
            return Err(InstrumentError::EmptyPair);
        }
        for (field, value) in [
            ("tolerance", self.tolerance),
            ("stop_buffer", self.stop_buffer),
            ("pip_multiplier", self.pip_multiplier),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(InstrumentError::NonPositive {
                    pair: self.pair.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

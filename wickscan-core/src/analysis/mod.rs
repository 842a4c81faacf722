//! Pure structure analysis: swings → trend → signal candle → setup.

pub mod setup;
pub mod swing;
pub mod trend;
pub mod wickless;

pub use setup::{calculate_setup, evaluate_setup, validate_setup, SetupValidation, SetupVerdict};
pub use swing::{find_swing_points, latest_swing};
pub use trend::classify_trend;
pub use wickless::{detect_signal_candle, SignalCandle};

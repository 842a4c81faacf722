//! Domain types for WickScan

pub mod candle;
pub mod direction;
pub mod ids;
pub mod instrument;
pub mod setup;
pub mod signal;
pub mod swing;
pub mod timeframe;

pub use candle::{Candle, CandleError, CandleSeries};
pub use direction::{Direction, TrendState};
pub use ids::{SetupId, SignalId};
pub use instrument::{InstrumentConfig, InstrumentError};
pub use setup::{ActiveSetup, SetupStatus, TradeSetup};
pub use signal::{Outcome, Signal};
pub use swing::{SwingKind, SwingPoint};
pub use timeframe::{ParseTimeframeError, Timeframe};

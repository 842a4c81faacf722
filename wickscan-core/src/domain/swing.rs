use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which extreme a swing point marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwingKind {
    High,
    Low,
}

/// A local price extreme used as a structure anchor.
///
/// `index` refers to the position in the complete-candle slice the swing was
/// detected on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub index: usize,
    pub time: DateTime<Utc>,
    pub price: f64,
    pub kind: SwingKind,
}

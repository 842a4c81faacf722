//! Candle fixtures shared by unit tests.

use chrono::{Duration, TimeZone, Utc};

use crate::domain::Candle;

/// Hourly complete candles from `(high, low)` pairs; open and close sit inside the range.
pub fn candles_from_hl(hl: &[(f64, f64)]) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    hl.iter()
        .enumerate()
        .map(|(i, &(high, low))| {
            let range = high - low;
            Candle {
                time: start + Duration::hours(i as i64),
                open: low + range * 0.25,
                high,
                low,
                close: low + range * 0.75,
                complete: true,
            }
        })
        .collect()
}

/// Higher-high/higher-low zigzag (swing lows 1.0965, 1.0985; highs 1.1025,
/// 1.1035) ending in a bullish wickless candle opening at 1.1010.
pub fn uptrend_with_signal() -> Vec<Candle> {
    let mids = [
        1.1000, 1.0990, 1.0980, 1.0970, 1.0980, 1.0990, 1.1000, 1.1010, 1.1020, 1.1010, 1.1000,
        1.0990, 1.1000, 1.1010, 1.1020, 1.1030, 1.1020, 1.1010, 1.1005,
    ];
    let hl: Vec<(f64, f64)> = mids.iter().map(|m| (m + 0.0005, m - 0.0005)).collect();
    let mut candles = candles_from_hl(&hl);
    let last_time = candles[candles.len() - 1].time;
    candles.push(Candle {
        time: last_time + Duration::hours(1),
        open: 1.1010,
        high: 1.1030,
        low: 1.1010,
        close: 1.1028,
        complete: true,
    });
    candles
}

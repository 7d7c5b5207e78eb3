use itertools::Itertools;
use itertools::MinMaxResult;
use std::cmp::Ordering;

use crate::config::SpikeConfig;
use crate::domain::Candle;
use crate::utils::mean;

/// Raw spike measurement taken off a candle series, before ticker enrichment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeReading {
    pub current_volume: f64,
    pub average_volume: f64,
    pub percentage_increase: f64,
    /// Close of the spike candle.
    pub close_price: f64,
    pub close_time_ms: i64,
}

/// Checks whether the newest candle's volume is an outlier against the
/// trailing average of the `lookback_candles` before it.
///
/// Candles must be ordered oldest to newest. Too little history and a zero
/// average are both "no spike", not faults.
pub fn detect_spike(candles: &[Candle], cfg: &SpikeConfig) -> Option<SpikeReading> {
    let lookback = cfg.lookback_candles;
    if candles.len() < lookback + 1 {
        return None;
    }

    let current = candles.last()?;
    let history = &candles[candles.len() - 1 - lookback..candles.len() - 1];
    let volumes: Vec<f64> = history.iter().map(|c| c.volume).collect();

    let average_volume = mean(&volumes);
    // A dead market has no meaningful baseline; calling everything a spike
    // (or dividing by zero) helps nobody.
    if average_volume <= 0.0 {
        return None;
    }

    if current.volume < average_volume * cfg.threshold_ratio {
        return None;
    }

    Some(SpikeReading {
        current_volume: current.volume,
        average_volume,
        percentage_increase: (current.volume / average_volume - 1.0) * 100.0,
        close_price: current.close,
        close_time_ms: current.close_time_ms,
    })
}

/// Swing bounds (high, low) over the most recent `window` candles, the spike
/// candle included. Feeds the retracement levels.
pub fn swing_bounds(candles: &[Candle], window: usize) -> Option<(f64, f64)> {
    let start = candles.len().saturating_sub(window);
    let recent = &candles[start..];

    match recent
        .iter()
        .flat_map(|c| [c.low, c.high])
        .minmax_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
    {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(only) => Some((only, only)),
        MinMaxResult::MinMax(low, high) => Some((high, low)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::constants;
    use crate::domain::flat_candle;

    fn series(history_volume: f64, count: usize, current_volume: f64) -> Vec<Candle> {
        let mut candles = vec![flat_candle(100.0, history_volume); count];
        candles.push(flat_candle(100.0, current_volume));
        candles
    }

    #[test]
    fn flags_a_volume_outlier() {
        let candles = series(10.0, 20, 25.0);
        let reading = detect_spike(&candles, &constants::DEFAULT.spike).unwrap();
        assert_eq!(reading.average_volume, 10.0);
        assert_eq!(reading.current_volume, 25.0);
        assert_eq!(reading.percentage_increase, 150.0);
    }

    #[test]
    fn below_threshold_is_quiet() {
        let candles = series(10.0, 20, 19.0);
        assert!(detect_spike(&candles, &constants::DEFAULT.spike).is_none());
    }

    #[test]
    fn short_history_is_no_spike_not_an_error() {
        let candles = series(10.0, 5, 100.0);
        assert!(detect_spike(&candles, &constants::DEFAULT.spike).is_none());
    }

    #[test]
    fn zero_average_volume_is_no_spike() {
        let candles = series(0.0, 20, 50.0);
        assert!(detect_spike(&candles, &constants::DEFAULT.spike).is_none());
    }

    #[test]
    fn swing_bounds_cover_the_recent_window() {
        let mut candles = Vec::new();
        for (high, low) in [(110.0, 90.0), (200.0, 100.0), (150.0, 120.0)] {
            candles.push(Candle::new(0, 0, low, high, low, high, 1.0, 1.0));
        }
        // Window of 2 skips the first candle entirely.
        assert_eq!(swing_bounds(&candles, 2), Some((200.0, 100.0)));
        assert_eq!(swing_bounds(&candles, 10), Some((200.0, 90.0)));
        assert_eq!(swing_bounds(&[], 5), None);
    }
}

use crate::config::constants::fibonacci::RETRACEMENT_RATIOS;
use crate::models::{FibonacciLevel, LevelProximity, SignalType, TrendDirection, level_rank};
use crate::utils::clamp_unit;

/// Retracement levels for a (high, low) swing, ascending by ratio.
///
/// A degenerate swing (high <= low, or a non-positive bound) carries no
/// meaningful retracement and yields no levels.
pub fn compute_levels(high: f64, low: f64) -> Vec<FibonacciLevel> {
    if high <= 0.0 || low <= 0.0 || high <= low {
        return Vec::new();
    }

    RETRACEMENT_RATIOS
        .iter()
        .map(|&ratio| FibonacciLevel::new(ratio, low + (high - low) * ratio))
        .collect()
}

/// Where the current price sits relative to a level set.
///
/// The first level within `tolerance` (relative deviation, ascending ratio
/// order) wins. Otherwise the closest level is reported as a near-miss so
/// callers can still rank it, with the deviation-to-tolerance ratio clamped
/// into [0, 1].
pub fn classify(price: f64, levels: &[FibonacciLevel], tolerance: f64) -> LevelProximity {
    if levels.is_empty() || price <= 0.0 {
        return LevelProximity::NONE;
    }

    for level in levels {
        let deviation = (price - level.price).abs() / level.price;
        if deviation <= tolerance {
            return LevelProximity {
                is_at_level: true,
                nearest_ratio: Some(level.ratio),
                price_to_fibo_ratio: Some(deviation / tolerance),
            };
        }
    }

    let mut closest = &levels[0];
    let mut min_deviation = (price - closest.price).abs() / closest.price;
    for level in &levels[1..] {
        let deviation = (price - level.price).abs() / level.price;
        if deviation < min_deviation {
            min_deviation = deviation;
            closest = level;
        }
    }

    LevelProximity {
        is_at_level: false,
        nearest_ratio: Some(closest.ratio),
        price_to_fibo_ratio: Some(clamp_unit(min_deviation / tolerance)),
    }
}

/// Which end of the swing the price currently leans towards. An exact tie
/// stays NEUTRAL.
pub fn determine_trend(current: f64, peak: f64, low: f64) -> TrendDirection {
    let to_peak = (current - peak).abs();
    let to_low = (current - low).abs();

    if to_peak < to_low {
        TrendDirection::Up
    } else if to_low < to_peak {
        TrendDirection::Down
    } else {
        TrendDirection::Neutral
    }
}

/// Trade signal for a trend at a retracement level.
///
/// Levels inside the 0.5-0.786 band signal with the trend: buying the dip in
/// an uptrend, selling the bounce in a downtrend.
pub fn classify_signal(trend: TrendDirection, ratio: Option<f64>) -> SignalType {
    let Some(ratio) = ratio else {
        return SignalType::Neutral;
    };
    if !(0.5..=0.786).contains(&ratio) {
        return SignalType::Neutral;
    }

    match trend {
        TrendDirection::Up => SignalType::Buy,
        TrendDirection::Down => SignalType::Sell,
        TrendDirection::Neutral => SignalType::Neutral,
    }
}

/// Signal score 0-100: a base per level (deeper retracements score higher),
/// discounted by how far inside the tolerance band the price sits.
pub fn signal_strength(ratio: Option<f64>, price_to_fibo_ratio: Option<f64>) -> u8 {
    let (Some(ratio), Some(closeness)) = (ratio, price_to_fibo_ratio) else {
        return 0;
    };

    let base: f64 = match level_rank(ratio) {
        3 => 90.0,
        2 => 80.0,
        1 => 70.0,
        _ => 50.0,
    };

    (base * (1.0 - closeness * 0.5)).round() as u8
}

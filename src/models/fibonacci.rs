use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// How close two retracement ratios must be to count as the same level.
const RATIO_EPSILON: f64 = 1e-9;

/// One retracement level derived from a (high, low) swing.
///
/// `reached` is a one-way flag: set the first time price comes within
/// tolerance of the level, never cleared, so "this level was touched"
/// survives later polls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibonacciLevel {
    pub ratio: f64,
    pub price: f64,
    pub reached: bool,
    pub reached_at: Option<i64>,
}

impl FibonacciLevel {
    pub fn new(ratio: f64, price: f64) -> Self {
        Self {
            ratio,
            price,
            reached: false,
            reached_at: None,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, Default,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum TrendDirection {
    Up,
    Down,
    #[default]
    Neutral,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, Default,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SignalType {
    Buy,
    Sell,
    #[default]
    Neutral,
}

/// Result of classifying a current price against a level set.
///
/// `price_to_fibo_ratio` scales deviation against the tolerance band:
/// 0 = exact hit, 1 = at (or beyond) the tolerance edge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LevelProximity {
    pub is_at_level: bool,
    pub nearest_ratio: Option<f64>,
    pub price_to_fibo_ratio: Option<f64>,
}

impl LevelProximity {
    pub(crate) const NONE: Self = Self {
        is_at_level: false,
        nearest_ratio: None,
        price_to_fibo_ratio: None,
    };
}

pub(crate) fn ratio_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < RATIO_EPSILON
}

/// Preference order of the tracked ratios: 0.786 > 0.618 > 0.5 > anything else.
pub(crate) fn level_rank(ratio: f64) -> u8 {
    if ratio_eq(ratio, 0.786) {
        3
    } else if ratio_eq(ratio, 0.618) {
        2
    } else if ratio_eq(ratio, 0.5) {
        1
    } else {
        0
    }
}

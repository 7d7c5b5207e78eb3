use serde::{Deserialize, Serialize};

use crate::domain::TimeInterval;
use crate::models::fibonacci::{FibonacciLevel, SignalType, TrendDirection};
use crate::utils::format_time_since;

/// One detected volume outlier. Immutable snapshot; a fresh one is computed
/// on every poll rather than mutating a past observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeSpike {
    pub symbol: String,
    pub interval: TimeInterval,
    pub current_volume: f64,
    pub average_volume: f64,
    pub percentage_increase: f64,
    /// Close price of the spike candle.
    pub price: f64,
    pub price_change_24h: f64,
    pub detected_at: i64,
}

/// The mutable, time-lived record the tracker keeps per symbol from spike
/// detection through expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedSpike {
    pub spike: VolumeSpike,

    pub spike_time: i64,
    /// Swing bounds the retracement levels were derived from.
    pub peak_price: f64,
    pub low_price: f64,
    pub current_price: f64,

    pub levels: Vec<FibonacciLevel>,
    pub nearest_ratio: Option<f64>,
    pub is_at_fibo_level: bool,
    pub trend: TrendDirection,
    pub signal: SignalType,
    /// 0-100; 0 also means "no level in play", which is why the level
    /// fields stay `Option` instead of leaning on the score.
    pub signal_strength: u8,
    pub price_to_fibo_ratio: Option<f64>,
}

impl TrackedSpike {
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.spike_time
    }

    pub fn time_since_spike(&self, now_ms: i64) -> String {
        format_time_since(self.spike_time, now_ms)
    }
}

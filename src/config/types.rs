//! Tunable analysis settings (Immutable Blueprints)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::config::constants;

/// Volume spike detection settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpikeConfig {
    /// Current volume must be at least this multiple of the trailing average.
    pub threshold_ratio: f64,
    /// Trailing candles the average is computed over.
    pub lookback_candles: usize,
    /// Recent candles the pre-spike swing high/low is extracted from.
    pub swing_window: usize,
}

/// Fibonacci retracement settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibonacciConfig {
    /// Relative deviation under which a price counts as "at" a level.
    pub tolerance: f64,
}

/// Spike tracker lifecycle settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Records older than this are swept out of the registry.
    pub max_age_ms: i64,
}

/// Order book wall / zone detection settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBookConfig {
    /// Quote-currency notional above which a single level is a wall.
    pub wall_notional_threshold: f64,
    /// Equal-width price buckets the snapshot range is divided into.
    pub bucket_count: usize,
    /// Buckets below this notional are discarded.
    pub min_zone_notional: f64,
    /// Zones kept per side after the descending-notional sort.
    pub zones_per_side: usize,
    /// Depth levels requested per snapshot.
    pub depth_limit: u32,
}

/// Poll cadences and request fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PollConfig {
    pub spike_scan: Duration,
    pub tracked_refresh: Duration,
    pub order_book: Duration,
    /// How long a cached symbol listing stays fresh.
    pub symbol_refresh: Duration,
    /// Budget for one REST request before the cycle gives up on it.
    pub request_timeout: Duration,
    /// Concurrent per-symbol requests in flight within one cycle.
    pub fan_out: usize,
}

/// The full configuration surface, overridable from a JSON file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    pub spike: SpikeConfig,
    pub fibonacci: FibonacciConfig,
    pub tracker: TrackerConfig,
    pub order_book: OrderBookConfig,
    pub polling: PollConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        constants::DEFAULT
    }
}

impl ScanConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_blueprint() {
        let config = ScanConfig::default();
        assert_eq!(config.spike.threshold_ratio, 2.0);
        assert_eq!(config.spike.lookback_candles, 20);
        assert_eq!(config.fibonacci.tolerance, 0.01);
        assert_eq!(config.order_book.wall_notional_threshold, 50_000.0);
    }

    #[test]
    fn survives_a_json_round_trip() {
        let config = ScanConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: ScanConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}

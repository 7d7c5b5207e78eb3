use crate::config::{
    FibonacciConfig, OrderBookConfig, PollConfig, ScanConfig, SpikeConfig, TrackerConfig,
};

pub mod spike {
    /// Current volume >= average * ratio counts as a spike.
    pub const THRESHOLD_RATIO: f64 = 2.0;
    pub const LOOKBACK_CANDLES: usize = 20;
    pub const SWING_WINDOW: usize = 5;
}

pub mod fibonacci {
    /// Retracement ratios tracked per spike, ascending.
    pub const RETRACEMENT_RATIOS: &[f64] = &[0.5, 0.618, 0.786];
    pub const LEVEL_TOLERANCE: f64 = 0.01;
}

pub mod tracker {
    use crate::utils::TimeUtils;
    pub const MAX_TRACKED_AGE_MS: i64 = TimeUtils::MS_IN_D;
    /// Head of the opportunity ranking shown by default.
    pub const TOP_OPPORTUNITIES: usize = 5;
}

pub mod orderbook {
    pub const WALL_NOTIONAL_THRESHOLD: f64 = 50_000.0;
    pub const ZONE_BUCKET_COUNT: usize = 20;
    pub const MIN_ZONE_NOTIONAL: f64 = 100_000.0;
    pub const ZONES_PER_SIDE: usize = 5;
    pub const DEPTH_LIMIT: u32 = 1000;
}

pub mod polling {
    use std::time::Duration;

    pub const SPIKE_SCAN: Duration = Duration::from_secs(60);
    pub const TRACKED_REFRESH: Duration = Duration::from_secs(30);
    pub const ORDER_BOOK: Duration = Duration::from_secs(15);
    pub const SYMBOL_REFRESH: Duration = Duration::from_secs(60 * 60);
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
    pub const FAN_OUT: usize = 8;
}

/// A pre-constructed ScanConfig for everything that starts from defaults
pub const DEFAULT: ScanConfig = ScanConfig {
    spike: SpikeConfig {
        threshold_ratio: spike::THRESHOLD_RATIO,
        lookback_candles: spike::LOOKBACK_CANDLES,
        swing_window: spike::SWING_WINDOW,
    },
    fibonacci: FibonacciConfig {
        tolerance: fibonacci::LEVEL_TOLERANCE,
    },
    tracker: TrackerConfig {
        max_age_ms: tracker::MAX_TRACKED_AGE_MS,
    },
    order_book: OrderBookConfig {
        wall_notional_threshold: orderbook::WALL_NOTIONAL_THRESHOLD,
        bucket_count: orderbook::ZONE_BUCKET_COUNT,
        min_zone_notional: orderbook::MIN_ZONE_NOTIONAL,
        zones_per_side: orderbook::ZONES_PER_SIDE,
        depth_limit: orderbook::DEPTH_LIMIT,
    },
    polling: PollConfig {
        spike_scan: polling::SPIKE_SCAN,
        tracked_refresh: polling::TRACKED_REFRESH,
        order_book: polling::ORDER_BOOK,
        symbol_refresh: polling::SYMBOL_REFRESH,
        request_timeout: polling::REQUEST_TIMEOUT,
        fan_out: polling::FAN_OUT,
    },
};

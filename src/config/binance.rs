/// REST constraints: endpoint weights, the per-minute weight budget, and
/// client defaults.
pub struct RestLimits {
    pub weight_limit_minute: u32,
    pub exchange_info_weight: u32,
    pub klines_weight: u32,
    pub ticker_weight: u32,
    pub depth_weight: u32,
}

pub struct ClientDefaults {
    pub timeout_ms: u64,
}

pub struct BinanceConfig {
    pub base_url: &'static str,
    pub limits: RestLimits,
    pub client: ClientDefaults,
}

pub const BINANCE: BinanceConfig = BinanceConfig {
    base_url: "https://api.binance.com/api/v3",
    limits: RestLimits {
        weight_limit_minute: 6000,
        exchange_info_weight: 20,
        klines_weight: 2,
        ticker_weight: 2,
        // Weight at the 1000-level depth limit.
        depth_weight: 50,
    },
    client: ClientDefaults { timeout_ms: 5000 },
};

mod gateway;
mod rate_limiter;
mod rest_model;

pub use {
    gateway::{BinanceGateway, MarketDataProvider},
    rate_limiter::GlobalRateLimiter,
    rest_model::Ticker24h,
};

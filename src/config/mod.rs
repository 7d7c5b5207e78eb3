//! Configuration module for the scanner.

// Can all be private now because we have a public re-export.
mod binance;
mod types;

// Public
pub mod constants;

// Re-export commonly used items
pub use binance::{BINANCE, BinanceConfig};
pub use types::{
    FibonacciConfig, OrderBookConfig, PollConfig, ScanConfig, SpikeConfig, TrackerConfig,
};

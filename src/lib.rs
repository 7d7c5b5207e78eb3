// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod models;
pub mod report;
pub mod utils;

// Re-export commonly used types outside of crate
pub use config::ScanConfig;
pub use data::{BinanceGateway, GlobalRateLimiter, MarketDataProvider};
pub use domain::TimeInterval;
pub use engine::ScannerEngine;

// CLI argument parsing
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Candle interval to scan (15m, 1h, 4h, 1d)
    #[arg(long, default_value = "1h")]
    pub interval: String,

    /// Quote asset the tradable-symbol listing is filtered by
    #[arg(long, default_value = "USDT")]
    pub quote_asset: String,

    /// Symbol to poll order-book analysis for (repeat for several)
    #[arg(long = "book-symbol")]
    pub book_symbols: Vec<String>,

    /// JSON file overriding the built-in scan defaults
    #[arg(long)]
    pub config: Option<PathBuf>,
}

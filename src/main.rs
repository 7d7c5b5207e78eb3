use std::panic;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::Parser;
use tokio::runtime::Runtime;
use tokio::time::MissedTickBehavior;

use spike_radar::Cli;
use spike_radar::config::{BINANCE, ScanConfig, constants};
use spike_radar::data::{BinanceGateway, GlobalRateLimiter};
use spike_radar::domain::TimeInterval;
use spike_radar::engine::ScannerEngine;
use spike_radar::report;
use spike_radar::utils::system_clock;

fn main() -> Result<()> {
    panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        log::error!("CRITICAL PANIC:\n{}\nStack Trace:\n{}", info, backtrace);
    }));

    let (global_level, my_code_level) = if cfg!(debug_assertions) {
        (log::LevelFilter::Warn, log::LevelFilter::Info)
    } else {
        (log::LevelFilter::Error, log::LevelFilter::Warn)
    };

    let mut builder = env_logger::Builder::new();
    builder
        .filter(None, global_level)
        .filter(Some("spike_radar"), my_code_level)
        .init();

    let args = Cli::parse();

    let runtime = Runtime::new()?;
    runtime.block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let interval = TimeInterval::from_str(&args.interval).map_err(|e| anyhow!(e))?;
    let config = match &args.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };

    let limiter = GlobalRateLimiter::new(BINANCE.limits.weight_limit_minute);
    let gateway = Arc::new(BinanceGateway::new(limiter)?);
    let mut engine = ScannerEngine::new(gateway, config, args.quote_asset.clone(), system_clock());

    let mut scan_ticks = tokio::time::interval(config.polling.spike_scan);
    let mut refresh_ticks = tokio::time::interval(config.polling.tracked_refresh);
    let mut book_ticks = tokio::time::interval(config.polling.order_book);
    // A late cycle is skipped, not queued; backlog under a degraded network
    // helps nobody.
    scan_ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    refresh_ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    book_ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

    log::info!(
        "scanning {} pairs on the {} interval",
        args.quote_asset,
        interval
    );

    loop {
        tokio::select! {
            _ = scan_ticks.tick() => {
                match engine.scan(interval).await {
                    Ok(outcome) => {
                        if outcome.is_partial() {
                            log::warn!(
                                "scan cycle partial: {}/{} symbols failed",
                                outcome.failed,
                                outcome.scanned
                            );
                        }
                        println!("\n=== Volume spikes ({}) ===", interval);
                        println!("{}", report::render_current_spikes(engine.current_spikes(interval)));
                    }
                    Err(e) => {
                        log::error!("scan cycle failed: {:#}", e);
                        if let Some(banner) = engine.last_error() {
                            eprintln!("! {}", banner);
                        }
                    }
                }
            }
            _ = refresh_ticks.tick() => {
                let outcome = engine.refresh_tracked().await;
                if outcome.is_partial() {
                    log::warn!(
                        "tracked refresh partial: {}/{} symbols failed",
                        outcome.failed,
                        outcome.scanned
                    );
                }
                let opportunities =
                    engine.top_opportunities(interval, constants::tracker::TOP_OPPORTUNITIES);
                println!("\n=== Top opportunities ({} tracked) ===", engine.tracked_count());
                println!("{}", report::render_opportunities(&opportunities, engine.now_ms()));
            }
            _ = book_ticks.tick() => {
                for symbol in &args.book_symbols {
                    match engine.order_book_analysis(symbol).await {
                        Ok(analysis) => {
                            println!("\n{}", report::render_order_book(symbol, &analysis));
                        }
                        Err(e) => log::warn!("order book poll failed for {}: {:#}", symbol, e),
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}

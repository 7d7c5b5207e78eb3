use anyhow::{Context, Result, anyhow};
use futures::stream::{self, StreamExt};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::timeout;

use crate::analysis::orderbook;
use crate::analysis::spike::{SpikeReading, detect_spike, swing_bounds};
use crate::config::{ScanConfig, SpikeConfig};
use crate::data::{MarketDataProvider, Ticker24h};
use crate::domain::TimeInterval;
use crate::engine::tracker::SpikeTracker;
use crate::models::{OrderBookAnalysis, TrackedSpike, VolumeSpike};
use crate::utils::Clock;

/// How one poll cycle went. `failed > 0` means partial data: those symbols
/// were skipped this cycle and will be observed again on the next one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    pub scanned: usize,
    pub spikes: usize,
    pub failed: usize,
}

impl CycleOutcome {
    pub fn is_partial(&self) -> bool {
        self.failed > 0
    }
}

/// What one symbol contributed to a scan cycle.
struct SymbolScan {
    reading: SpikeReading,
    ticker: Ticker24h,
    swing: Option<(f64, f64)>,
}

/// Orchestrates the polling pipeline: symbol listing -> per-symbol spike
/// detection -> tracker upkeep -> order book snapshots. Owns the only
/// cross-poll state (the tracker and the last cycle's results).
pub struct ScannerEngine {
    provider: Arc<dyn MarketDataProvider>,
    tracker: SpikeTracker,
    config: ScanConfig,
    clock: Arc<dyn Clock>,
    quote_asset: String,

    /// Cached tradable-symbol listing, refreshed on a slow cadence.
    symbols: Vec<String>,
    symbols_fetched_at: i64,

    /// Last completed scan per interval; survives failed cycles.
    current_spikes: HashMap<TimeInterval, Vec<VolumeSpike>>,
    /// Banner condition for the presentation layer after a fatal cycle.
    last_error: Option<String>,
}

impl ScannerEngine {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        config: ScanConfig,
        quote_asset: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tracker = SpikeTracker::new(
            config.fibonacci.tolerance,
            config.tracker.max_age_ms,
            Arc::clone(&clock),
        );

        Self {
            provider,
            tracker,
            config,
            clock,
            quote_asset: quote_asset.into(),
            symbols: Vec::new(),
            symbols_fetched_at: 0,
            current_spikes: HashMap::new(),
            last_error: None,
        }
    }

    /// One spike-scan cycle over every tradable symbol.
    ///
    /// Individual symbols may fail (timeout, bad payload) without aborting
    /// the cycle; only a missing symbol listing is fatal, and then the
    /// previous cycle's results stay visible.
    pub async fn scan(&mut self, interval: TimeInterval) -> Result<CycleOutcome> {
        let symbols = match self.ensure_symbols().await {
            Ok(symbols) => symbols,
            Err(e) => {
                self.last_error = Some(format!("{:#}", e));
                return Err(e);
            }
        };

        let request_timeout = self.config.polling.request_timeout;
        let spike_cfg = self.config.spike;
        let provider = Arc::clone(&self.provider);

        let results: Vec<(String, Result<Option<SymbolScan>>)> =
            stream::iter(symbols.into_iter().map(|symbol| {
                let provider = Arc::clone(&provider);
                async move {
                    let scanned = timeout(
                        request_timeout,
                        scan_symbol(provider, &symbol, interval, spike_cfg),
                    )
                    .await
                    .unwrap_or_else(|_| Err(anyhow!("request timed out")));
                    (symbol, scanned)
                }
            }))
            .buffer_unordered(self.config.polling.fan_out.max(1))
            .collect()
            .await;

        let mut outcome = CycleOutcome {
            scanned: results.len(),
            ..CycleOutcome::default()
        };

        let mut spikes = Vec::new();
        for (symbol, result) in results {
            match result {
                Ok(Some(scan)) => {
                    let spike = VolumeSpike {
                        symbol,
                        interval,
                        current_volume: scan.reading.current_volume,
                        average_volume: scan.reading.average_volume,
                        percentage_increase: scan.reading.percentage_increase,
                        price: scan.reading.close_price,
                        price_change_24h: scan.ticker.price_change_percent,
                        detected_at: self.clock.now_ms(),
                    };
                    if let Some((peak, low)) = scan.swing {
                        self.tracker.record_spike(spike.clone(), peak, low);
                    }
                    spikes.push(spike);
                }
                Ok(None) => {}
                Err(e) => {
                    outcome.failed += 1;
                    log::warn!("scan skipped {}: {:#}", symbol, e);
                }
            }
        }

        spikes.sort_by(|a, b| {
            b.percentage_increase
                .partial_cmp(&a.percentage_increase)
                .unwrap_or(Ordering::Equal)
        });
        outcome.spikes = spikes.len();
        self.current_spikes.insert(interval, spikes);
        self.last_error = None;

        Ok(outcome)
    }

    /// Re-prices every tracked spike and sweeps out the expired ones.
    /// A failed price fetch leaves that symbol's record untouched for this
    /// cycle.
    pub async fn refresh_tracked(&mut self) -> CycleOutcome {
        let symbols = self.tracker.tracked_symbols();
        let request_timeout = self.config.polling.request_timeout;
        let provider = Arc::clone(&self.provider);

        let results: Vec<(String, Result<Ticker24h>)> =
            stream::iter(symbols.into_iter().map(|symbol| {
                let provider = Arc::clone(&provider);
                async move {
                    let fetched = timeout(request_timeout, provider.ticker_24h(&symbol))
                        .await
                        .unwrap_or_else(|_| Err(anyhow!("request timed out")));
                    (symbol, fetched)
                }
            }))
            .buffer_unordered(self.config.polling.fan_out.max(1))
            .collect()
            .await;

        let mut outcome = CycleOutcome {
            scanned: results.len(),
            ..CycleOutcome::default()
        };

        for (symbol, result) in results {
            match result {
                Ok(ticker) => {
                    self.tracker.apply_price(&symbol, ticker.last_price);
                }
                Err(e) => {
                    outcome.failed += 1;
                    log::warn!("refresh left {} unchanged: {:#}", symbol, e);
                }
            }
        }

        let evicted = self.tracker.sweep_expired();
        if evicted > 0 {
            log::info!("swept {} expired spike record(s)", evicted);
        }

        outcome
    }

    /// Walls and concentration zones from a fresh depth snapshot.
    pub async fn order_book_analysis(&self, symbol: &str) -> Result<OrderBookAnalysis> {
        let book = timeout(
            self.config.polling.request_timeout,
            self.provider.depth(symbol, self.config.order_book.depth_limit),
        )
        .await
        .unwrap_or_else(|_| Err(anyhow!("depth request timed out")))
        .with_context(|| format!("order book unavailable for {}", symbol))?;

        Ok(orderbook::analyze(&book, &self.config.order_book))
    }

    // --- QUERIES ---

    /// Last completed scan for an interval, sorted by percentage increase.
    pub fn current_spikes(&self, interval: TimeInterval) -> &[VolumeSpike] {
        self.current_spikes
            .get(&interval)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Tracked spikes sitting at a retracement level, best first.
    pub fn tracked_at_fibo_levels(&self, interval: TimeInterval) -> Vec<TrackedSpike> {
        self.tracker.at_fibo_levels(interval)
    }

    pub fn top_opportunities(&self, interval: TimeInterval, limit: usize) -> Vec<TrackedSpike> {
        self.tracker.top_opportunities(interval, limit)
    }

    pub fn tracked_count(&self) -> usize {
        self.tracker.len()
    }

    /// Error banner from the most recent fatal cycle, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Fetches the symbol listing when the cache is stale, falling back to
    /// the cached listing if a refresh fails mid-flight.
    async fn ensure_symbols(&mut self) -> Result<Vec<String>> {
        let now_ms = self.clock.now_ms();
        let refresh_ms = self.config.polling.symbol_refresh.as_millis() as i64;
        let stale = self.symbols.is_empty() || now_ms - self.symbols_fetched_at > refresh_ms;

        if stale {
            match self.provider.tradable_symbols(&self.quote_asset).await {
                Ok(listing) => {
                    log::info!(
                        "symbol listing refreshed: {} {} pairs",
                        listing.len(),
                        self.quote_asset
                    );
                    self.symbols = listing;
                    self.symbols_fetched_at = now_ms;
                }
                Err(e) if self.symbols.is_empty() => {
                    return Err(e.context("symbol listing unavailable"));
                }
                Err(e) => {
                    log::warn!(
                        "symbol refresh failed, keeping {} cached pairs: {:#}",
                        self.symbols.len(),
                        e
                    );
                }
            }
        }

        Ok(self.symbols.clone())
    }
}

async fn scan_symbol(
    provider: Arc<dyn MarketDataProvider>,
    symbol: &str,
    interval: TimeInterval,
    cfg: SpikeConfig,
) -> Result<Option<SymbolScan>> {
    let candles = provider
        .klines(symbol, interval, cfg.lookback_candles + 1)
        .await?;

    let Some(reading) = detect_spike(&candles, &cfg) else {
        return Ok(None);
    };

    // Only spiking symbols pay for the extra ticker call.
    let ticker = provider.ticker_24h(symbol).await?;
    let swing = swing_bounds(&candles, cfg.swing_window);

    Ok(Some(SymbolScan {
        reading,
        ticker,
        swing,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

    use crate::domain::{Candle, flat_candle};
    use crate::models::{OrderBook, SignalType};
    use crate::utils::{ManualClock, TimeUtils};

    /// Scripted market: fixed candle series per symbol, mutable ticker
    /// prices, and switches to make individual endpoints fail.
    struct MockProvider {
        candles: HashMap<String, Vec<Candle>>,
        prices: Mutex<HashMap<String, f64>>,
        failing_tickers: Mutex<HashSet<String>>,
        listing_down: AtomicBool,
    }

    impl MockProvider {
        fn new(candles: HashMap<String, Vec<Candle>>) -> Self {
            let prices = candles
                .iter()
                .map(|(symbol, series)| {
                    (symbol.clone(), series.last().map(|c| c.close).unwrap_or(0.0))
                })
                .collect();
            Self {
                candles,
                prices: Mutex::new(prices),
                failing_tickers: Mutex::new(HashSet::new()),
                listing_down: AtomicBool::new(false),
            }
        }

        fn set_price(&self, symbol: &str, price: f64) {
            self.prices
                .lock()
                .unwrap()
                .insert(symbol.to_string(), price);
        }

        fn fail_ticker(&self, symbol: &str) {
            self.failing_tickers
                .lock()
                .unwrap()
                .insert(symbol.to_string());
        }

        fn take_listing_down(&self) {
            self.listing_down.store(true, AtomicOrdering::SeqCst);
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        async fn tradable_symbols(&self, _quote_asset: &str) -> Result<Vec<String>> {
            if self.listing_down.load(AtomicOrdering::SeqCst) {
                bail!("exchange info unavailable");
            }
            let mut symbols: Vec<String> = self.candles.keys().cloned().collect();
            symbols.sort();
            Ok(symbols)
        }

        async fn klines(
            &self,
            symbol: &str,
            _interval: TimeInterval,
            _limit: usize,
        ) -> Result<Vec<Candle>> {
            match self.candles.get(symbol) {
                Some(series) => Ok(series.clone()),
                None => bail!("unknown symbol {}", symbol),
            }
        }

        async fn ticker_24h(&self, symbol: &str) -> Result<Ticker24h> {
            if self.failing_tickers.lock().unwrap().contains(symbol) {
                bail!("ticker fetch failed for {}", symbol);
            }
            let price = *self.prices.lock().unwrap().get(symbol).unwrap_or(&0.0);
            Ok(Ticker24h {
                symbol: symbol.to_string(),
                last_price: price,
                price_change_percent: 2.5,
            })
        }

        async fn depth(&self, _symbol: &str, _limit: u32) -> Result<OrderBook> {
            bail!("not scripted");
        }
    }

    /// 20 flat candles then a spike candle closing at `close` whose swing
    /// spans 100..200.
    fn spiking_series(close: f64, current_volume: f64) -> Vec<Candle> {
        let mut candles = vec![flat_candle(150.0, 10.0); 20];
        candles.push(Candle::new(
            0,
            0,
            100.0,
            200.0,
            100.0,
            close,
            current_volume,
            close * current_volume,
        ));
        candles
    }

    fn quiet_series() -> Vec<Candle> {
        vec![flat_candle(150.0, 10.0); 21]
    }

    fn engine_with(provider: Arc<MockProvider>, clock: Arc<ManualClock>) -> ScannerEngine {
        ScannerEngine::new(
            provider,
            ScanConfig::default(),
            "USDT",
            clock,
        )
    }

    #[tokio::test]
    async fn scan_emits_spikes_sorted_by_percentage_increase() {
        let provider = Arc::new(MockProvider::new(HashMap::from([
            ("AAAUSDT".to_string(), spiking_series(200.0, 25.0)),
            ("BBBUSDT".to_string(), spiking_series(200.0, 40.0)),
            ("QUIETUSDT".to_string(), quiet_series()),
        ])));
        let clock = Arc::new(ManualClock::new(1_000));
        let mut engine = engine_with(provider, clock);

        let outcome = engine.scan(TimeInterval::H1).await.unwrap();
        assert_eq!(outcome.scanned, 3);
        assert_eq!(outcome.spikes, 2);
        assert!(!outcome.is_partial());

        let spikes = engine.current_spikes(TimeInterval::H1);
        assert_eq!(spikes.len(), 2);
        // 40/10 -> 300%, 25/10 -> 150%.
        assert_eq!(spikes[0].symbol, "BBBUSDT");
        assert_eq!(spikes[0].percentage_increase, 300.0);
        assert_eq!(spikes[1].percentage_increase, 150.0);
        assert_eq!(spikes[1].price_change_24h, 2.5);

        // Both spiking symbols entered the tracker; the quiet one did not.
        assert_eq!(engine.tracked_count(), 2);
    }

    #[tokio::test]
    async fn per_symbol_failure_does_not_abort_the_cycle() {
        let provider = Arc::new(MockProvider::new(HashMap::from([
            ("GOODUSDT".to_string(), spiking_series(200.0, 25.0)),
            ("BADUSDT".to_string(), spiking_series(200.0, 25.0)),
        ])));
        provider.fail_ticker("BADUSDT");
        let clock = Arc::new(ManualClock::new(0));
        let mut engine = engine_with(provider, clock);

        let outcome = engine.scan(TimeInterval::H1).await.unwrap();
        assert!(outcome.is_partial());
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.spikes, 1);
        assert_eq!(engine.current_spikes(TimeInterval::H1)[0].symbol, "GOODUSDT");
    }

    #[tokio::test]
    async fn refresh_updates_survivors_and_leaves_failed_symbols_unchanged() {
        let provider = Arc::new(MockProvider::new(HashMap::from([
            ("AAAUSDT".to_string(), spiking_series(200.0, 25.0)),
            ("BBBUSDT".to_string(), spiking_series(200.0, 25.0)),
        ])));
        let clock = Arc::new(ManualClock::new(0));
        let mut engine = engine_with(provider.clone(), clock);
        engine.scan(TimeInterval::H1).await.unwrap();

        // AAA retraces to the golden ratio; BBB's feed starts failing.
        provider.set_price("AAAUSDT", 161.8);
        provider.fail_ticker("BBBUSDT");

        let outcome = engine.refresh_tracked().await;
        assert_eq!(outcome.scanned, 2);
        assert_eq!(outcome.failed, 1);

        let at_levels = engine.tracked_at_fibo_levels(TimeInterval::H1);
        assert_eq!(at_levels.len(), 1);
        assert_eq!(at_levels[0].spike.symbol, "AAAUSDT");
        assert_eq!(at_levels[0].nearest_ratio, Some(0.618));
        assert_eq!(at_levels[0].signal, SignalType::Buy);

        let top = engine.top_opportunities(TimeInterval::H1, 5);
        assert_eq!(top.len(), 1);
    }

    #[tokio::test]
    async fn listing_failure_is_fatal_and_sets_the_banner() {
        let provider = Arc::new(MockProvider::new(HashMap::from([(
            "AAAUSDT".to_string(),
            spiking_series(200.0, 25.0),
        )])));
        provider.take_listing_down();
        let clock = Arc::new(ManualClock::new(0));
        let mut engine = engine_with(provider, clock);

        assert!(engine.scan(TimeInterval::H1).await.is_err());
        assert!(engine.last_error().is_some());
        assert!(engine.current_spikes(TimeInterval::H1).is_empty());
    }

    #[tokio::test]
    async fn stale_listing_falls_back_to_the_cache() {
        let provider = Arc::new(MockProvider::new(HashMap::from([(
            "AAAUSDT".to_string(),
            spiking_series(200.0, 25.0),
        )])));
        let clock = Arc::new(ManualClock::new(0));
        let mut engine = engine_with(provider.clone(), clock.clone());

        engine.scan(TimeInterval::H1).await.unwrap();

        // Listing goes down and the cache ages past its refresh window; the
        // cycle keeps running on the cached listing.
        provider.take_listing_down();
        clock.advance(2 * TimeUtils::MS_IN_H);
        let outcome = engine.scan(TimeInterval::H1).await.unwrap();
        assert_eq!(outcome.scanned, 1);
        assert!(engine.last_error().is_none());
    }

    #[tokio::test]
    async fn expired_records_disappear_after_the_next_refresh() {
        let provider = Arc::new(MockProvider::new(HashMap::from([(
            "AAAUSDT".to_string(),
            spiking_series(200.0, 25.0),
        )])));
        let clock = Arc::new(ManualClock::new(0));
        let mut engine = engine_with(provider.clone(), clock.clone());

        engine.scan(TimeInterval::H1).await.unwrap();
        provider.set_price("AAAUSDT", 161.8);
        engine.refresh_tracked().await;
        assert_eq!(engine.tracked_at_fibo_levels(TimeInterval::H1).len(), 1);

        clock.advance(TimeUtils::MS_IN_D + 1);
        engine.refresh_tracked().await;
        assert!(engine.tracked_at_fibo_levels(TimeInterval::H1).is_empty());
        assert_eq!(engine.tracked_count(), 0);
    }
}

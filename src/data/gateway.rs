use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::BINANCE;
use crate::data::rate_limiter::GlobalRateLimiter;
use crate::data::rest_model::{DepthSnapshot, ExchangeInfo, RawKline, Ticker24h};
use crate::domain::{Candle, TimeInterval};
use crate::models::OrderBook;

/// Abstract interface for fetching market data.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Symbols currently trading against the given quote asset.
    async fn tradable_symbols(&self, quote_asset: &str) -> Result<Vec<String>>;

    /// Candle series for a symbol, oldest to newest.
    async fn klines(
        &self,
        symbol: &str,
        interval: TimeInterval,
        limit: usize,
    ) -> Result<Vec<Candle>>;

    /// 24-hour rolling ticker for a symbol.
    async fn ticker_24h(&self, symbol: &str) -> Result<Ticker24h>;

    /// Depth snapshot for a symbol.
    async fn depth(&self, symbol: &str, limit: u32) -> Result<OrderBook>;
}

pub struct BinanceGateway {
    client: Client,
    base_url: String,
    limiter: GlobalRateLimiter,
}

impl BinanceGateway {
    pub fn new(limiter: GlobalRateLimiter) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(BINANCE.client.timeout_ms))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: BINANCE.base_url.to_string(),
            limiter,
        })
    }
}

#[async_trait]
impl MarketDataProvider for BinanceGateway {
    async fn tradable_symbols(&self, quote_asset: &str) -> Result<Vec<String>> {
        self.limiter
            .acquire(BINANCE.limits.exchange_info_weight, "exchangeInfo")
            .await;

        let url = format!("{}/exchangeInfo", self.base_url);
        let info: ExchangeInfo = self
            .client
            .get(&url)
            .send()
            .await
            .context("exchangeInfo request failed")?
            .error_for_status()
            .context("exchangeInfo returned an error status")?
            .json()
            .await
            .context("exchangeInfo payload did not decode")?;

        Ok(info
            .symbols
            .into_iter()
            .filter(|s| s.is_tradable(quote_asset))
            .map(|s| s.symbol)
            .collect())
    }

    async fn klines(
        &self,
        symbol: &str,
        interval: TimeInterval,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        self.limiter
            .acquire(BINANCE.limits.klines_weight, symbol)
            .await;

        let url = format!("{}/klines", self.base_url);
        let limit_param = limit.to_string();
        let raw: Vec<RawKline> = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval.bn_name()),
                ("limit", limit_param.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("klines request failed for {}", symbol))?
            .error_for_status()
            .with_context(|| format!("klines returned an error status for {}", symbol))?
            .json()
            .await
            .with_context(|| format!("klines payload did not decode for {}", symbol))?;

        raw.into_iter()
            .map(|row| Candle::try_from(row).map_err(anyhow::Error::new))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("bad kline row for {}", symbol))
    }

    async fn ticker_24h(&self, symbol: &str) -> Result<Ticker24h> {
        self.limiter
            .acquire(BINANCE.limits.ticker_weight, symbol)
            .await;

        let url = format!("{}/ticker/24hr", self.base_url);
        self.client
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await
            .with_context(|| format!("ticker request failed for {}", symbol))?
            .error_for_status()
            .with_context(|| format!("ticker returned an error status for {}", symbol))?
            .json()
            .await
            .with_context(|| format!("ticker payload did not decode for {}", symbol))
    }

    async fn depth(&self, symbol: &str, limit: u32) -> Result<OrderBook> {
        self.limiter
            .acquire(BINANCE.limits.depth_weight, symbol)
            .await;

        let url = format!("{}/depth", self.base_url);
        let limit_param = limit.to_string();
        let snapshot: DepthSnapshot = self
            .client
            .get(&url)
            .query(&[("symbol", symbol), ("limit", limit_param.as_str())])
            .send()
            .await
            .with_context(|| format!("depth request failed for {}", symbol))?
            .error_for_status()
            .with_context(|| format!("depth returned an error status for {}", symbol))?
            .json()
            .await
            .with_context(|| format!("depth payload did not decode for {}", symbol))?;

        OrderBook::try_from(snapshot)
            .map_err(anyhow::Error::new)
            .with_context(|| format!("bad depth level for {}", symbol))
    }
}

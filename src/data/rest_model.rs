//! Wire types for the four REST payloads the scanner consumes.
//!
//! Binance sends prices, quantities and volumes as JSON strings
//! (e.g. `"volume":"1234.5"`); everything numeric goes through a parsing
//! deserializer or an explicit conversion into the domain types.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::{error::Error, fmt};

use crate::domain::Candle;
use crate::models::{OrderBook, OrderBookEntry};

fn de_str_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<f64>().map_err(serde::de::Error::custom)
}

// ---- exchangeInfo ----

#[derive(Debug, Deserialize)]
pub struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    pub status: String,
    pub quote_asset: String,
}

impl SymbolInfo {
    pub fn is_tradable(&self, quote_asset: &str) -> bool {
        self.status == "TRADING" && self.quote_asset == quote_asset
    }
}

// ---- ticker/24hr ----

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24h {
    pub symbol: String,
    #[serde(deserialize_with = "de_str_f64")]
    pub last_price: f64,
    #[serde(deserialize_with = "de_str_f64")]
    pub price_change_percent: f64,
}

// ---- klines ----

/// One kline row as it arrives: a mixed-type JSON array
/// `[openTime, open, high, low, close, volume, closeTime, quoteVolume, ...]`.
pub type RawKline = Vec<Value>;

#[derive(Debug)]
pub enum WireError {
    KlineLength(usize),
    KlineField(&'static str),
    DepthField(&'static str),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WireError::KlineLength(len) => write!(f, "kline row too short: {} fields", len),
            WireError::KlineField(name) => write!(f, "bad kline field: {}", name),
            WireError::DepthField(name) => write!(f, "bad depth field: {}", name),
        }
    }
}

impl Error for WireError {}

fn kline_f64(raw: &RawKline, idx: usize, name: &'static str) -> Result<f64, WireError> {
    raw.get(idx)
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or(WireError::KlineField(name))
}

fn kline_i64(raw: &RawKline, idx: usize, name: &'static str) -> Result<i64, WireError> {
    raw.get(idx)
        .and_then(Value::as_i64)
        .ok_or(WireError::KlineField(name))
}

impl TryFrom<RawKline> for Candle {
    type Error = WireError;

    fn try_from(raw: RawKline) -> Result<Self, Self::Error> {
        if raw.len() < 8 {
            return Err(WireError::KlineLength(raw.len()));
        }

        Ok(Candle::new(
            kline_i64(&raw, 0, "open_time")?,
            kline_i64(&raw, 6, "close_time")?,
            kline_f64(&raw, 1, "open")?,
            kline_f64(&raw, 2, "high")?,
            kline_f64(&raw, 3, "low")?,
            kline_f64(&raw, 4, "close")?,
            kline_f64(&raw, 5, "volume")?,
            kline_f64(&raw, 7, "quote_volume")?,
        ))
    }
}

// ---- depth ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthSnapshot {
    pub last_update_id: u64,
    pub bids: Vec<[String; 2]>,
    pub asks: Vec<[String; 2]>,
}

fn parse_level(level: &[String; 2]) -> Result<OrderBookEntry, WireError> {
    let price = level[0]
        .parse::<f64>()
        .map_err(|_| WireError::DepthField("price"))?;
    let quantity = level[1]
        .parse::<f64>()
        .map_err(|_| WireError::DepthField("quantity"))?;
    Ok(OrderBookEntry { price, quantity })
}

impl TryFrom<DepthSnapshot> for OrderBook {
    type Error = WireError;

    fn try_from(snapshot: DepthSnapshot) -> Result<Self, Self::Error> {
        let bids = snapshot
            .bids
            .iter()
            .map(parse_level)
            .collect::<Result<Vec<_>, _>>()?;
        let asks = snapshot
            .asks
            .iter()
            .map(parse_level)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(OrderBook {
            last_update_id: snapshot.last_update_id,
            bids,
            asks,
        })
    }
}

// Define the Candle struct with all its properties
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub open_time_ms: i64,
    pub close_time_ms: i64,

    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,

    /// Volume in the base asset (what spike detection compares).
    pub volume: f64,
    /// Volume in the quote asset.
    pub quote_volume: f64,
}

impl Candle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        open_time_ms: i64,
        close_time_ms: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        quote_volume: f64,
    ) -> Self {
        Candle {
            open_time_ms,
            close_time_ms,
            open,
            high,
            low,
            close,
            volume,
            quote_volume,
        }
    }
}

#[cfg(test)]
pub(crate) fn flat_candle(close: f64, volume: f64) -> Candle {
    Candle::new(0, 0, close, close, close, close, volume, close * volume)
}

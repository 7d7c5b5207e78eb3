use tabled::{Table, Tabled, settings::Style};

use crate::models::{OrderBookAnalysis, TrackedSpike, VolumeSpike};
use crate::utils::epoch_ms_to_time_string;

#[derive(Tabled)]
struct SpikeRow {
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Volume")]
    volume: String,
    #[tabled(rename = "Avg Volume")]
    average: String,
    #[tabled(rename = "Increase")]
    increase: String,
    #[tabled(rename = "24h")]
    change_24h: String,
    #[tabled(rename = "Detected")]
    detected: String,
}

#[derive(Tabled)]
struct OpportunityRow {
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Signal")]
    signal: String,
    #[tabled(rename = "Strength")]
    strength: u8,
    #[tabled(rename = "Fib Level")]
    level: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Trend")]
    trend: String,
    #[tabled(rename = "Spike")]
    spike_pct: String,
    #[tabled(rename = "Since Spike")]
    age: String,
}

#[derive(Tabled)]
struct WallRow {
    #[tabled(rename = "Side")]
    side: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Notional")]
    notional: String,
}

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "Side")]
    side: String,
    #[tabled(rename = "Price Range")]
    range: String,
    #[tabled(rename = "Notional")]
    notional: String,
}

pub fn render_current_spikes(spikes: &[VolumeSpike]) -> String {
    if spikes.is_empty() {
        return "No volume spikes this cycle.".to_string();
    }

    let rows: Vec<SpikeRow> = spikes
        .iter()
        .map(|s| SpikeRow {
            symbol: s.symbol.clone(),
            price: fmt_price(s.price),
            volume: fmt_compact(s.current_volume),
            average: fmt_compact(s.average_volume),
            increase: format!("+{:.1}%", s.percentage_increase),
            change_24h: format!("{:+.2}%", s.price_change_24h),
            detected: epoch_ms_to_time_string(s.detected_at),
        })
        .collect();

    Table::new(rows).with(Style::sharp()).to_string()
}

pub fn render_opportunities(records: &[TrackedSpike], now_ms: i64) -> String {
    if records.is_empty() {
        return "No tracked spikes at a Fibonacci level.".to_string();
    }

    let rows: Vec<OpportunityRow> = records
        .iter()
        .map(|r| OpportunityRow {
            symbol: r.spike.symbol.clone(),
            signal: r.signal.to_string(),
            strength: r.signal_strength,
            level: r
                .nearest_ratio
                .map(|ratio| format!("{:.3}", ratio))
                .unwrap_or_else(|| "-".to_string()),
            price: fmt_price(r.current_price),
            trend: r.trend.to_string(),
            spike_pct: format!("+{:.1}%", r.spike.percentage_increase),
            age: r.time_since_spike(now_ms),
        })
        .collect();

    Table::new(rows).with(Style::sharp()).to_string()
}

pub fn render_order_book(symbol: &str, analysis: &OrderBookAnalysis) -> String {
    let mut out = String::new();

    if analysis.walls.is_empty() {
        out.push_str(&format!("{}: no order walls above threshold.\n", symbol));
    } else {
        let rows: Vec<WallRow> = analysis
            .walls
            .iter()
            .map(|w| WallRow {
                side: w.side.to_string(),
                price: fmt_price(w.price),
                quantity: format!("{:.4}", w.quantity),
                notional: fmt_compact(w.notional()),
            })
            .collect();
        out.push_str(&format!("{} walls:\n", symbol));
        out.push_str(&Table::new(rows).with(Style::sharp()).to_string());
        out.push('\n');
    }

    if analysis.zones.is_empty() {
        out.push_str(&format!("{}: no volume concentration zones.", symbol));
    } else {
        let rows: Vec<ZoneRow> = analysis
            .zones
            .iter()
            .map(|z| ZoneRow {
                side: z.side.to_string(),
                range: z.range_label(),
                notional: fmt_compact(z.notional),
            })
            .collect();
        out.push_str(&format!("{} volume zones:\n", symbol));
        out.push_str(&Table::new(rows).with(Style::sharp()).to_string());
    }

    out
}

// Precision by magnitude, so sub-dollar symbols stay readable.
fn fmt_price(price: f64) -> String {
    if price < 1.0 {
        format!("{:.6}", price)
    } else if price < 100.0 {
        format!("{:.4}", price)
    } else {
        format!("{:.2}", price)
    }
}

/// Compact quantity notation: 1234567.0 -> "1.23M".
fn fmt_compact(value: f64) -> String {
    const K: f64 = 1_000.0;
    const M: f64 = 1_000_000.0;
    const B: f64 = 1_000_000_000.0;

    if value >= B {
        format!("{:.2}B", value / B)
    } else if value >= M {
        format!("{:.2}M", value / M)
    } else if value >= K {
        format!("{:.2}K", value / K)
    } else {
        format!("{:.2}", value)
    }
}

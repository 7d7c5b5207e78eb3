use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// One resting price level of a depth snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBookEntry {
    pub price: f64,
    pub quantity: f64,
}

impl OrderBookEntry {
    /// Value of the level in quote currency.
    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }
}

/// Depth snapshot; each side holds unique price levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub last_update_id: u64,
    pub bids: Vec<OrderBookEntry>,
    pub asks: Vec<OrderBookEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum WallSide {
    Bid,
    Ask,
}

/// A single level whose notional clears the wall threshold. Derived per
/// snapshot, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderWall {
    pub price: f64,
    pub quantity: f64,
    pub side: WallSide,
}

impl OrderWall {
    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }
}

/// Aggregated notional volume in one price bucket of the snapshot range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeZone {
    pub range_low: f64,
    pub range_high: f64,
    pub notional: f64,
    pub side: WallSide,
}

impl VolumeZone {
    pub fn range_label(&self) -> String {
        format!(
            "{} - {}",
            format_zone_price(self.range_low),
            format_zone_price(self.range_high)
        )
    }
}

// Precision by magnitude, so sub-dollar symbols stay readable.
fn format_zone_price(price: f64) -> String {
    if price < 1.0 {
        format!("{:.6}", price)
    } else if price < 100.0 {
        format!("{:.4}", price)
    } else {
        format!("{:.2}", price)
    }
}

/// What the order-book poll hands to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookAnalysis {
    pub walls: Vec<OrderWall>,
    pub zones: Vec<VolumeZone>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notional_is_price_times_quantity() {
        let entry = OrderBookEntry {
            price: 100.0,
            quantity: 600.0,
        };
        assert_eq!(entry.notional(), 60_000.0);
    }

    #[test]
    fn zone_labels_scale_precision_with_magnitude() {
        let zone = VolumeZone {
            range_low: 0.00123,
            range_high: 0.00456,
            notional: 1.0,
            side: WallSide::Bid,
        };
        assert_eq!(zone.range_label(), "0.001230 - 0.004560");
    }
}

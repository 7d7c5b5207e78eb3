use itertools::Itertools;
use itertools::MinMaxResult;
use std::cmp::Ordering;

use crate::config::OrderBookConfig;
use crate::models::{OrderBook, OrderBookAnalysis, OrderWall, VolumeZone, WallSide};

/// Full snapshot analysis: walls plus concentration zones.
pub fn analyze(book: &OrderBook, cfg: &OrderBookConfig) -> OrderBookAnalysis {
    OrderBookAnalysis {
        walls: detect_walls(book, cfg.wall_notional_threshold),
        zones: concentration_zones(book, cfg),
    }
}

/// Levels whose notional value clears the threshold, bids then asks.
///
/// A snapshot missing either side is treated as unusable and yields nothing;
/// the min/max price range the rest of the analysis leans on is undefined.
pub fn detect_walls(book: &OrderBook, notional_threshold: f64) -> Vec<OrderWall> {
    if book.bids.is_empty() || book.asks.is_empty() {
        return Vec::new();
    }

    let mut walls = Vec::new();
    for bid in &book.bids {
        if bid.notional() >= notional_threshold {
            walls.push(OrderWall {
                price: bid.price,
                quantity: bid.quantity,
                side: WallSide::Bid,
            });
        }
    }
    for ask in &book.asks {
        if ask.notional() >= notional_threshold {
            walls.push(OrderWall {
                price: ask.price,
                quantity: ask.quantity,
                side: WallSide::Ask,
            });
        }
    }
    walls
}

/// Buckets the snapshot's price range into `bucket_count` equal-width bands
/// and sums notional volume per band, each side independently. Bands under
/// the zone floor are dropped; each side keeps its top `zones_per_side` by
/// descending notional. Bid zones come first in the output.
pub fn concentration_zones(book: &OrderBook, cfg: &OrderBookConfig) -> Vec<VolumeZone> {
    if book.bids.is_empty() || book.asks.is_empty() {
        return Vec::new();
    }

    let all_prices = book.bids.iter().chain(book.asks.iter()).map(|e| e.price);
    let (min_price, max_price) =
        match all_prices.minmax_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal)) {
            MinMaxResult::NoElements => return Vec::new(),
            MinMaxResult::OneElement(only) => (only, only),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        };

    let bucket_count = cfg.bucket_count.max(1);
    let width = (max_price - min_price) / bucket_count as f64;

    // Every entry at one price collapses the range; the sole bucket then
    // holds all volume.
    let bucket_of = |price: f64| -> usize {
        if width <= 0.0 {
            0
        } else {
            (((price - min_price) / width).floor() as usize).min(bucket_count - 1)
        }
    };

    let mut bid_buckets = vec![0.0_f64; bucket_count];
    let mut ask_buckets = vec![0.0_f64; bucket_count];
    for bid in &book.bids {
        bid_buckets[bucket_of(bid.price)] += bid.notional();
    }
    for ask in &book.asks {
        ask_buckets[bucket_of(ask.price)] += ask.notional();
    }

    let side_zones = |buckets: &[f64], side: WallSide| -> Vec<VolumeZone> {
        let mut zones: Vec<VolumeZone> = buckets
            .iter()
            .enumerate()
            .filter(|&(_, &notional)| notional >= cfg.min_zone_notional)
            .map(|(idx, &notional)| VolumeZone {
                range_low: min_price + width * idx as f64,
                range_high: if width <= 0.0 {
                    max_price
                } else {
                    min_price + width * (idx + 1) as f64
                },
                notional,
                side,
            })
            .collect();
        zones.sort_by(|a, b| {
            b.notional
                .partial_cmp(&a.notional)
                .unwrap_or(Ordering::Equal)
        });
        zones.truncate(cfg.zones_per_side);
        zones
    };

    let mut zones = side_zones(&bid_buckets, WallSide::Bid);
    zones.extend(side_zones(&ask_buckets, WallSide::Ask));
    zones
}

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use crate::analysis::fibonacci::{
    classify, classify_signal, compute_levels, determine_trend, signal_strength,
};
use crate::domain::TimeInterval;
use crate::models::{SignalType, TrackedSpike, VolumeSpike, level_rank};
use crate::utils::Clock;

/// Registry of in-flight spikes, one record per symbol.
///
/// The only cross-poll state in the pipeline. Records are overwritten in
/// place on every refresh and removed by an explicit expiry sweep; a symbol
/// that spikes again simply restarts its record (last write wins).
pub struct SpikeTracker {
    records: HashMap<String, TrackedSpike>,
    tolerance: f64,
    max_age_ms: i64,
    clock: Arc<dyn Clock>,
}

impl SpikeTracker {
    pub fn new(tolerance: f64, max_age_ms: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: HashMap::new(),
            tolerance,
            max_age_ms,
            clock,
        }
    }

    /// Starts (or restarts) tracking a symbol from a fresh spike and the
    /// swing that produced it.
    pub fn record_spike(&mut self, spike: VolumeSpike, peak_price: f64, low_price: f64) {
        let symbol = spike.symbol.clone();
        let levels = compute_levels(peak_price, low_price);
        let trend = determine_trend(spike.price, peak_price, low_price);

        let record = TrackedSpike {
            spike_time: self.clock.now_ms(),
            peak_price,
            low_price,
            current_price: spike.price,
            levels,
            nearest_ratio: None,
            is_at_fibo_level: false,
            trend,
            signal: SignalType::Neutral,
            signal_strength: 0,
            price_to_fibo_ratio: None,
            spike,
        };

        self.records.insert(symbol, record);
    }

    /// Re-derives every signal field of a tracked symbol from a fresh price.
    /// Returns false when the symbol is not tracked.
    pub fn apply_price(&mut self, symbol: &str, current_price: f64) -> bool {
        let now_ms = self.clock.now_ms();
        let tolerance = self.tolerance;
        let Some(record) = self.records.get_mut(symbol) else {
            return false;
        };

        record.current_price = current_price;

        // Touch history is one-way: once reached, a level stays reached.
        for level in &mut record.levels {
            if !level.reached {
                let deviation = (current_price - level.price).abs() / level.price;
                if deviation <= tolerance {
                    level.reached = true;
                    level.reached_at = Some(now_ms);
                }
            }
        }

        let proximity = classify(current_price, &record.levels, tolerance);
        record.trend = determine_trend(current_price, record.peak_price, record.low_price);
        record.is_at_fibo_level = proximity.is_at_level;
        record.nearest_ratio = proximity.nearest_ratio;
        record.price_to_fibo_ratio = proximity.price_to_fibo_ratio;

        if proximity.is_at_level {
            record.signal = classify_signal(record.trend, proximity.nearest_ratio);
            record.signal_strength =
                signal_strength(proximity.nearest_ratio, proximity.price_to_fibo_ratio);
        } else {
            record.signal = SignalType::Neutral;
            record.signal_strength = 0;
        }

        true
    }

    /// Drops every record older than the tracking window. Returns how many
    /// went.
    pub fn sweep_expired(&mut self) -> usize {
        let now_ms = self.clock.now_ms();
        let max_age_ms = self.max_age_ms;
        let before = self.records.len();
        self.records
            .retain(|_, record| record.age_ms(now_ms) <= max_age_ms);
        before - self.records.len()
    }

    pub fn tracked_symbols(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    pub fn get(&self, symbol: &str) -> Option<&TrackedSpike> {
        self.records.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Tracked spikes sitting at a retracement level right now, best first.
    pub fn at_fibo_levels(&self, interval: TimeInterval) -> Vec<TrackedSpike> {
        let mut hits: Vec<TrackedSpike> = self
            .records
            .values()
            .filter(|r| r.is_at_fibo_level && r.spike.interval == interval)
            .cloned()
            .collect();
        hits.sort_by(rank_opportunities);
        hits
    }

    pub fn top_opportunities(&self, interval: TimeInterval, limit: usize) -> Vec<TrackedSpike> {
        let mut hits = self.at_fibo_levels(interval);
        hits.truncate(limit);
        hits
    }
}

/// Ranking for opportunity views: strength, then level preference
/// (0.786 > 0.618 > 0.5 > other), then the size of the original spike.
fn rank_opportunities(a: &TrackedSpike, b: &TrackedSpike) -> Ordering {
    b.signal_strength
        .cmp(&a.signal_strength)
        .then_with(|| level_preference(b).cmp(&level_preference(a)))
        .then_with(|| {
            b.spike
                .percentage_increase
                .partial_cmp(&a.spike.percentage_increase)
                .unwrap_or(Ordering::Equal)
        })
}

fn level_preference(record: &TrackedSpike) -> u8 {
    record.nearest_ratio.map(level_rank).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{ManualClock, TimeUtils};

    fn spike(symbol: &str, price: f64, pct: f64) -> VolumeSpike {
        VolumeSpike {
            symbol: symbol.to_string(),
            interval: TimeInterval::H1,
            current_volume: 25.0,
            average_volume: 10.0,
            percentage_increase: pct,
            price,
            price_change_24h: 1.0,
            detected_at: 0,
        }
    }

    fn tracker(clock: Arc<ManualClock>) -> SpikeTracker {
        SpikeTracker::new(0.01, TimeUtils::MS_IN_D, clock)
    }

    #[test]
    fn one_record_per_symbol_last_write_wins() {
        let clock = Arc::new(ManualClock::new(0));
        let mut tracker = tracker(clock);

        tracker.record_spike(spike("BTCUSDT", 200.0, 150.0), 200.0, 100.0);
        tracker.record_spike(spike("BTCUSDT", 300.0, 80.0), 300.0, 150.0);

        assert_eq!(tracker.len(), 1);
        let record = tracker.get("BTCUSDT").unwrap();
        assert_eq!(record.peak_price, 300.0);
        assert_eq!(record.spike.percentage_increase, 80.0);
    }

    #[test]
    fn reached_flags_never_revert() {
        let clock = Arc::new(ManualClock::new(1_000));
        let mut tracker = tracker(clock.clone());
        tracker.record_spike(spike("ETHUSDT", 200.0, 150.0), 200.0, 100.0);

        // Price touches the 0.618 level (161.8), then leaves it.
        clock.advance(1_000);
        assert!(tracker.apply_price("ETHUSDT", 161.8));
        let touched = tracker.get("ETHUSDT").unwrap();
        assert!(touched.is_at_fibo_level);
        let golden = touched.levels[1];
        assert!(golden.reached);
        assert_eq!(golden.reached_at, Some(2_000));

        clock.advance(1_000);
        assert!(tracker.apply_price("ETHUSDT", 190.0));
        let after = tracker.get("ETHUSDT").unwrap();
        assert!(!after.is_at_fibo_level);
        assert_eq!(after.signal_strength, 0);
        // The touch history survives.
        assert!(after.levels[1].reached);
        assert_eq!(after.levels[1].reached_at, Some(2_000));
    }

    #[test]
    fn signals_update_with_the_price() {
        let clock = Arc::new(ManualClock::new(0));
        let mut tracker = tracker(clock);
        tracker.record_spike(spike("SOLUSDT", 200.0, 150.0), 200.0, 100.0);

        // 178.6 is the 0.786 level; closer to peak than low, so an uptrend.
        tracker.apply_price("SOLUSDT", 178.6);
        let record = tracker.get("SOLUSDT").unwrap();
        assert!(record.is_at_fibo_level);
        assert_eq!(record.nearest_ratio, Some(0.786));
        assert_eq!(record.signal, SignalType::Buy);
        assert_eq!(record.signal_strength, 90);
    }

    #[test]
    fn unknown_symbols_are_ignored() {
        let clock = Arc::new(ManualClock::new(0));
        let mut tracker = tracker(clock);
        assert!(!tracker.apply_price("NOPEUSDT", 1.0));
    }

    #[test]
    fn sweep_removes_only_expired_records() {
        let clock = Arc::new(ManualClock::new(0));
        let mut tracker = tracker(clock.clone());

        tracker.record_spike(spike("OLDUSDT", 200.0, 150.0), 200.0, 100.0);
        clock.advance(2 * TimeUtils::MS_IN_H);
        tracker.record_spike(spike("NEWUSDT", 200.0, 150.0), 200.0, 100.0);

        // 23h after the first spike: both inside the window.
        clock.advance(21 * TimeUtils::MS_IN_H);
        assert_eq!(tracker.sweep_expired(), 0);

        // 25h after the first, 23h after the second.
        clock.advance(2 * TimeUtils::MS_IN_H);
        assert_eq!(tracker.sweep_expired(), 1);
        assert!(tracker.get("OLDUSDT").is_none());
        assert!(tracker.get("NEWUSDT").is_some());
    }

    #[test]
    fn evicted_symbols_leave_the_opportunity_views() {
        let clock = Arc::new(ManualClock::new(0));
        let mut tracker = tracker(clock.clone());
        tracker.record_spike(spike("BTCUSDT", 200.0, 150.0), 200.0, 100.0);
        tracker.apply_price("BTCUSDT", 161.8);
        assert_eq!(tracker.at_fibo_levels(TimeInterval::H1).len(), 1);

        clock.advance(TimeUtils::MS_IN_D + 1);
        tracker.sweep_expired();
        assert!(tracker.at_fibo_levels(TimeInterval::H1).is_empty());
    }

    #[test]
    fn opportunity_ranking_is_strength_then_level_then_size() {
        let clock = Arc::new(ManualClock::new(0));
        let mut tracker = tracker(clock);

        // Same swing for everyone; distinguish by the price they sit at and
        // the size of the original spike.
        tracker.record_spike(spike("AUSDT", 200.0, 50.0), 200.0, 100.0);
        tracker.record_spike(spike("BUSDT", 200.0, 300.0), 200.0, 100.0);
        tracker.record_spike(spike("CUSDT", 200.0, 100.0), 200.0, 100.0);

        tracker.apply_price("AUSDT", 178.6); // 0.786 exact -> strength 90
        tracker.apply_price("BUSDT", 161.8); // 0.618 exact -> strength 80
        tracker.apply_price("CUSDT", 161.8); // 0.618 exact -> strength 80

        let ranked = tracker.at_fibo_levels(TimeInterval::H1);
        let symbols: Vec<&str> = ranked.iter().map(|r| r.spike.symbol.as_str()).collect();
        // A wins on strength; B beats C on percentage increase.
        assert_eq!(symbols, vec!["AUSDT", "BUSDT", "CUSDT"]);

        let top = tracker.top_opportunities(TimeInterval::H1, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].spike.symbol, "AUSDT");
    }
}

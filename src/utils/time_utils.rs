use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct TimeUtils;

impl TimeUtils {
    pub const MS_IN_S: i64 = 1000;
    pub const MS_IN_MIN: i64 = Self::MS_IN_S * 60;
    pub const MS_IN_15_MIN: i64 = Self::MS_IN_MIN * 15;
    pub const MS_IN_H: i64 = Self::MS_IN_MIN * 60;
    pub const MS_IN_4_H: i64 = Self::MS_IN_H * 4;
    pub const MS_IN_D: i64 = Self::MS_IN_H * 24;
}

/// Source of "now" for anything age-related (spike eviction, time-since
/// labels). Injected so eviction logic is testable without wall-clock sleeps.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Production clock backed by the system time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

pub fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

/// Manually advanced clock for tests.
#[cfg(test)]
pub struct ManualClock(std::sync::atomic::AtomicI64);

#[cfg(test)]
impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self(std::sync::atomic::AtomicI64::new(start_ms))
    }

    pub fn advance(&self, delta_ms: i64) {
        self.0
            .fetch_add(delta_ms, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}

// Time Helper functions

pub fn epoch_ms_to_time_string(epoch_ms: i64) -> String {
    let dt = DateTime::from_timestamp_millis(epoch_ms).unwrap_or_default();
    format!("{}", dt.format("%H:%M"))
}

/// Human label for how long ago a spike fired, e.g. `2h 30m`.
/// Clocks out of sync (negative diff) collapse to `0m`.
pub fn format_time_since(event_ms: i64, now_ms: i64) -> String {
    if event_ms <= 0 {
        return "N/A".to_string();
    }

    let diff_ms = now_ms - event_ms;
    if diff_ms < 0 {
        return "0m".to_string();
    }

    let hours = diff_ms / TimeUtils::MS_IN_H;
    let minutes = (diff_ms % TimeUtils::MS_IN_H) / TimeUtils::MS_IN_MIN;

    if hours > 0 {
        return format!("{}h {}m", hours, minutes);
    }
    if minutes == 0 {
        return "Just now".to_string();
    }
    format!("{}m", minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_since_formats_hours_and_minutes() {
        let now = TimeUtils::MS_IN_D;
        let event = now - (2 * TimeUtils::MS_IN_H + 30 * TimeUtils::MS_IN_MIN);
        assert_eq!(format_time_since(event, now), "2h 30m");
    }

    #[test]
    fn time_since_just_now_and_minutes() {
        let now = TimeUtils::MS_IN_H;
        assert_eq!(
            format_time_since(now - 10 * TimeUtils::MS_IN_S, now),
            "Just now"
        );
        assert_eq!(format_time_since(now - 5 * TimeUtils::MS_IN_MIN, now), "5m");
    }

    #[test]
    fn time_since_handles_clock_skew_and_missing() {
        assert_eq!(format_time_since(0, 1000), "N/A");
        // Event "in the future" if the system clocks disagree.
        assert_eq!(format_time_since(5000, 1000), "0m");
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(100);
        clock.advance(50);
        assert_eq!(clock.now_ms(), 150);
    }
}

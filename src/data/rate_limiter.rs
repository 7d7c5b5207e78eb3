use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

/// Shared minute-window budget for Binance request weight.
///
/// Every REST call acquires its endpoint weight first; once the window is
/// saturated the caller sleeps until the next wall-clock minute, which is
/// when Binance resets the counter.
#[derive(Clone)]
pub struct GlobalRateLimiter {
    inner: Arc<Mutex<WeightWindow>>,
}

struct WeightWindow {
    used_weight: u32,
    /// The wall-clock minute (minutes since epoch) the counter belongs to.
    minute_idx: u64,
    limit: u32,
}

impl GlobalRateLimiter {
    pub fn new(limit: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WeightWindow {
                used_weight: 0,
                minute_idx: current_minute_idx(),
                limit,
            })),
        }
    }

    /// Blocks until `weight` fits into the current minute's budget.
    pub async fn acquire(&self, weight: u32, context: &str) {
        loop {
            let (wait, used, limit) = {
                let mut window = self.inner.lock().await;
                let now_idx = current_minute_idx();

                if now_idx > window.minute_idx {
                    window.used_weight = 0;
                    window.minute_idx = now_idx;
                }

                if window.used_weight + weight <= window.limit {
                    window.used_weight += weight;
                    return;
                }

                let seconds_into_minute = now_epoch_secs() % 60;
                // Land safely inside the next minute.
                let wait = Duration::from_secs(60 - seconds_into_minute)
                    + Duration::from_millis(100);
                (wait, window.used_weight, window.limit)
            };

            log::warn!(
                "Rate limit saturated for [{}]. Used: {}/{}. Waiting {:.1}s for the next window...",
                context,
                used,
                limit,
                wait.as_secs_f64()
            );

            tokio::time::sleep(wait).await;
        }
    }
}

fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

fn current_minute_idx() -> u64 {
    now_epoch_secs() / 60
}

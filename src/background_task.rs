use chrono::Utc;
use tokio::time::{interval, Duration};

use crate::limiter::rate_limiter::RateLimitStore;

/// Periodically drops rate-limit entries whose window has closed, keeping the
/// in-memory map bounded. Entries still mid-window are never touched.
pub async fn start_sweep_task<S: RateLimitStore>(store: S, every: Duration) {
    let mut interval = interval(every);

    loop {
        interval.tick().await;

        let removed = store.sweep_expired(Utc::now());
        if removed > 0 {
            tracing::info!("Swept {} expired rate-limit entries", removed);
        }
    }
}

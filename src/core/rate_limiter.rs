// src/core/rate_limiter.rs
//! Minimum spacing between calls to a rate-limited provider

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

pub struct RateLimiter {
    interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_call: Mutex::new(None),
        }
    }

    /// `calls` of zero disables limiting
    pub fn per_minute(calls: u32) -> Self {
        let interval = if calls == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(60) / calls
        };
        Self::new(interval)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the next call is allowed and reserve the slot
    pub async fn wait(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(previous) = *last_call {
            let ready_at = previous + self.interval;
            let now = Instant::now();
            if ready_at > now {
                debug!("Rate limit: waiting {:?}", ready_at - now);
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last_call = Some(Instant::now());
    }
}

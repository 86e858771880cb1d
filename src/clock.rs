//! Injectable wall-clock and sleep
//!
//! The publish loop sleeps between ticks and between reconnect attempts; this
//! seam lets tests run the loop to completion without real delays.

use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait Clock: Send + Sync {
    /// Current wall-clock time in epoch seconds.
    fn epoch(&self) -> f64;

    /// Sleep for the given duration.
    async fn sleep(&self, duration: Duration);
}

/// Real time via chrono and tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn epoch(&self) -> f64 {
        chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

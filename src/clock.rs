//! Time source for timed sequences (probe pacing, lip-sync, idle loop).

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the tokio timer. Under `tokio::time::pause()` it runs on
/// virtual time, which is how the timing tests avoid real delays.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

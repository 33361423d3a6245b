//! Trailing-edge debounce for search input.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Collapses bursts of calls into the last one.
///
/// Every [`settle`](Debouncer::settle) call waits out the delay and then
/// reports whether it is still the most recent call. Clones share the counter.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait for the delay; `true` if no newer call started meanwhile.
    pub async fn settle(&self) -> bool {
        let mine = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        sleep(self.delay).await;
        self.generation.load(Ordering::SeqCst) == mine
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::from_millis(300)
    }
}

async fn sleep(delay: Duration) {
    #[cfg(target_arch = "wasm32")]
    gloo_timers::future::sleep(delay).await;
    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(delay).await;
}

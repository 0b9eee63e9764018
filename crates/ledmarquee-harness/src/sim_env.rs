//! Virtual clock.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use ledmarquee_core::Environment;

/// Environment whose clock only moves when told to.
///
/// `sleep` advances the clock by the requested duration and yields once, so
/// a tick loop driven by `SimEnv` runs as fast as the executor allows while
/// observing exactly the time it asked for. Clones share one clock.
#[derive(Clone, Default)]
pub struct SimEnv {
    now: Arc<Mutex<Duration>>,
}

impl SimEnv {
    /// Clock starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }

    /// Time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Environment for SimEnv {
    type Instant = Duration;

    fn now(&self) -> Duration {
        self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
        tokio::task::yield_now().await;
    }
}

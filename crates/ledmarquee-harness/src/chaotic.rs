//! Chaotic transport wrapper for fault injection testing
//!
//! Transport wrapper that randomly fails writes and can slow every write
//! down. Used to check that a failing or sluggish cable never stalls a port
//! queue and that coalescing keeps only the freshest frame.

use std::{
    io,
    pin::Pin,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    task::{Context, Poll, ready},
    time::Duration,
};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::{
    io::{AsyncRead, AsyncWrite, ReadBuf},
    time::Sleep,
};

/// Transport wrapper that randomly injects write failures and latency.
///
/// Delegates to an underlying transport. Each write first waits out the
/// configured latency, then fails with probability `failure_rate` without
/// touching the inner transport. Reads pass through untouched.
pub struct ChaoticTransport<T> {
    inner: T,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    latency: Duration,
    delay: Option<Pin<Box<Sleep>>>,
    /// Seeded for reproducible chaos
    rng: Arc<Mutex<ChaCha8Rng>>,
    writes: Arc<AtomicUsize>,
    failures: Arc<AtomicUsize>,
}

impl<T> ChaoticTransport<T> {
    /// Wrap `inner` with the given failure rate.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn new(inner: T, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// Create with explicit seed for reproducible chaos
    pub fn with_seed(inner: T, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            latency: Duration::ZERO,
            delay: None,
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
            writes: Arc::new(AtomicUsize::new(0)),
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delay every write by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Shared write counter, readable after the transport has been moved
    /// into a session.
    pub fn write_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.writes)
    }

    /// Shared counter of injected failures.
    pub fn failure_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.failures)
    }

    fn should_fail(&self) -> bool {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).gen_bool(self.failure_rate)
    }
}

impl<T: AsyncRead + Unpin> AsyncRead for ChaoticTransport<T> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl<T: AsyncWrite + Unpin> AsyncWrite for ChaoticTransport<T> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if !self.latency.is_zero() {
            let latency = self.latency;
            let delay = self.delay.get_or_insert_with(|| Box::pin(tokio::time::sleep(latency)));
            ready!(delay.as_mut().poll(cx));
            self.delay = None;
        }

        self.writes.fetch_add(1, Ordering::Relaxed);
        if self.should_fail() {
            self.failures.fetch_add(1, Ordering::Relaxed);
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "chaotic failure injection")));
        }
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

//! Raw byte I/O over a module's serial stream.
//!
//! [`PortOperations`] splits a full-duplex stream into independently locked
//! read and write directions. Locks are taken with `try_lock`: a direction
//! that is already held is a lock-discipline violation and fails loudly
//! instead of waiting. Waiting is the [`PortMutex`](crate::PortMutex)'s job.

use std::time::Duration;

use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf},
    sync::Mutex,
};

use crate::error::PortError;

/// Full-duplex byte stream to one module.
///
/// Provided by the host: a serial device file, a USB CDC handle, or an
/// in-memory pipe in tests.
pub trait Transport: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> Transport for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

type Reader = ReadHalf<Box<dyn Transport>>;
type Writer = WriteHalf<Box<dyn Transport>>;

/// Direction-locked raw I/O on one transport.
///
/// # Invariants
///
/// - At most one `rx` and at most one `tx` run at any instant. A second
///   concurrent call on the same direction returns
///   [`PortError::ReadLocked`] / [`PortError::WriteLocked`].
/// - Every `tx` flushes before releasing the write direction, whether or not
///   the write itself succeeded. Writes are never coalesced on the wire.
pub struct PortOperations {
    reader: Mutex<Reader>,
    writer: Mutex<Writer>,
    read_timeout: Duration,
}

impl PortOperations {
    /// Wrap a transport. `read_timeout` bounds every `rx`.
    pub fn new(transport: impl Transport, read_timeout: Duration) -> Self {
        let boxed: Box<dyn Transport> = Box::new(transport);
        let (reader, writer) = tokio::io::split(boxed);
        Self { reader: Mutex::new(reader), writer: Mutex::new(writer), read_timeout }
    }

    /// Read timeout applied to every `rx`.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Read up to `length` bytes.
    ///
    /// A reply may arrive split across several reads; this keeps reading
    /// until `length` bytes are collected, the stream ends, or the read
    /// timeout elapses. On timeout the partial bytes collected so far are
    /// returned, so callers must check the length before trusting content.
    ///
    /// # Errors
    ///
    /// - `PortError::ReadLocked` if another read is in progress
    /// - `PortError::Io` if the stream fails
    pub async fn rx(&self, length: usize) -> Result<Vec<u8>, PortError> {
        let mut reader = self.reader.try_lock().map_err(|_| PortError::ReadLocked)?;
        let mut response = Vec::with_capacity(length);

        let collect = async {
            let mut chunk = [0u8; 64];
            while response.len() < length {
                let want = (length - response.len()).min(chunk.len());
                let n = reader.read(&mut chunk[..want]).await?;
                if n == 0 {
                    break;
                }
                response.extend_from_slice(&chunk[..n]);
            }
            Ok::<(), std::io::Error>(())
        };

        let outcome = tokio::time::timeout(self.read_timeout, collect).await;
        match outcome {
            Ok(result) => result?,
            Err(_) => {
                tracing::trace!(
                    expected = length,
                    received = response.len(),
                    timeout = ?self.read_timeout,
                    "read timed out"
                );
            },
        }

        Ok(response)
    }

    /// Write `buffer` in full, then flush.
    ///
    /// The flush runs even if the write failed so the write direction is
    /// never left half torn down.
    ///
    /// # Errors
    ///
    /// - `PortError::WriteLocked` if another write is in progress
    /// - `PortError::Io` if the write or the flush fails
    pub async fn tx(&self, buffer: &[u8]) -> Result<(), PortError> {
        let mut writer = self.writer.try_lock().map_err(|_| PortError::WriteLocked)?;

        let written = writer.write_all(buffer).await;
        let flushed = writer.flush().await;
        drop(writer);

        written?;
        flushed?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn rx_collects_split_reply() {
        let (ours, mut theirs) = tokio::io::duplex(64);
        let port = PortOperations::new(ours, Duration::from_secs(1));

        theirs.write_all(&[1, 2]).await.unwrap();
        theirs.write_all(&[3, 4, 5]).await.unwrap();

        assert_eq!(port.rx(5).await.unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn rx_never_reads_past_length() {
        let (ours, mut theirs) = tokio::io::duplex(64);
        let port = PortOperations::new(ours, Duration::from_secs(1));

        theirs.write_all(&[1, 2, 3, 4]).await.unwrap();

        assert_eq!(port.rx(3).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(port.rx(1).await.unwrap(), vec![4]);
    }

    #[tokio::test(start_paused = true)]
    async fn rx_timeout_returns_partial_bytes() {
        let (ours, mut theirs) = tokio::io::duplex(64);
        let port = PortOperations::new(ours, Duration::from_secs(3));

        theirs.write_all(&[9, 9]).await.unwrap();

        assert_eq!(port.rx(32).await.unwrap(), vec![9, 9]);
    }

    #[tokio::test]
    async fn rx_stops_at_end_of_stream() {
        let (ours, theirs) = tokio::io::duplex(64);
        let port = PortOperations::new(ours, Duration::from_secs(3));
        drop(theirs);

        assert_eq!(port.rx(32).await.unwrap(), Vec::<u8>::new());
    }

    #[tokio::test]
    async fn tx_writes_whole_buffer() {
        let (ours, mut theirs) = tokio::io::duplex(64);
        let port = PortOperations::new(ours, Duration::from_secs(1));

        port.tx(&[0x32, 0xAC, 0x20]).await.unwrap();

        let mut buf = [0u8; 3];
        theirs.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, [0x32, 0xAC, 0x20]);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_rx_is_rejected() {
        let (ours, _theirs) = tokio::io::duplex(64);
        let port = Arc::new(PortOperations::new(ours, Duration::from_secs(3)));

        let holder = Arc::clone(&port);
        let pending = tokio::spawn(async move { holder.rx(32).await });
        tokio::task::yield_now().await;

        assert_eq!(port.rx(1).await, Err(PortError::ReadLocked));
        assert!(pending.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn concurrent_tx_is_rejected() {
        // 1-byte pipe that nobody drains: the first write parks holding the lock
        let (ours, _theirs) = tokio::io::duplex(1);
        let port = Arc::new(PortOperations::new(ours, Duration::from_secs(1)));

        let holder = Arc::clone(&port);
        let _pending = tokio::spawn(async move { holder.tx(&[0; 16]).await });
        tokio::task::yield_now().await;

        assert_eq!(port.tx(&[1]).await, Err(PortError::WriteLocked));
    }
}

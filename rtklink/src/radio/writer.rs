//! Chunked transmission of one payload.

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::config::{ChunkConfig, RetryPolicy};
use super::device::{DeviceError, RadioDevice};
use super::error::RadioError;
use super::stats::TransportStats;

/// Everything a transmission needs besides the payload.
pub(crate) struct Transmission<'a, D> {
    pub(crate) device: &'a D,
    pub(crate) chunk: &'a ChunkConfig,
    pub(crate) retry: &'a RetryPolicy,
    pub(crate) stats: &'a TransportStats,
    /// Cancelled when the link goes away; stops the payload without retries.
    pub(crate) abort: &'a CancellationToken,
}

impl<D: RadioDevice> Transmission<'_, D> {
    /// Send `payload` chunk by chunk, strictly in sequence.
    pub(crate) async fn send(&self, payload: &[u8]) -> Result<(), RadioError> {
        let size = self.chunk.chunk_size.max(1);
        let total = payload.len().div_ceil(size);

        for (index, piece) in payload.chunks(size).enumerate() {
            if index > 0 && !self.chunk.inter_chunk_delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = self.abort.cancelled() => return Err(RadioError::Disconnected),
                    _ = tokio::time::sleep(self.chunk.inter_chunk_delay) => {}
                }
            }
            self.send_chunk(index, piece).await?;
            trace!(chunk = index + 1, total, bytes = piece.len(), "Chunk sent");
        }

        Ok(())
    }

    /// One chunk with bounded retry on the busy condition only.
    async fn send_chunk(&self, index: usize, piece: &[u8]) -> Result<(), RadioError> {
        let mut attempt: u32 = 0;

        loop {
            if self.abort.is_cancelled() {
                return Err(RadioError::Disconnected);
            }

            let outcome = tokio::select! {
                biased;
                _ = self.abort.cancelled() => return Err(RadioError::Disconnected),
                outcome = self.device.write_chunk(piece) => outcome,
            };

            match outcome {
                Ok(()) => {
                    self.stats.record_chunk();
                    return Ok(());
                }
                Err(DeviceError::InProgress) => {
                    attempt += 1;
                    if attempt >= self.retry.max_attempts {
                        return Err(RadioError::RetriesExhausted {
                            chunk: index,
                            attempts: attempt,
                        });
                    }

                    let delay = self.retry.delay_for(attempt - 1);
                    self.stats.record_retry();
                    debug!(
                        chunk = index,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Radio busy, retrying chunk"
                    );

                    tokio::select! {
                        biased;
                        _ = self.abort.cancelled() => return Err(RadioError::Disconnected),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(DeviceError::NotConnected) => return Err(RadioError::Disconnected),
                Err(source) => {
                    return Err(RadioError::WriteFailed {
                        chunk: index,
                        source,
                    })
                }
            }
        }
    }
}

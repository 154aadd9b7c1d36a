//! Transport counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters updated by the writer.
#[derive(Debug, Default)]
pub struct TransportStats {
    payloads_sent: AtomicU64,
    chunks_sent: AtomicU64,
    retries: AtomicU64,
    failures: AtomicU64,
}

/// Point-in-time copy of [`TransportStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStatsSnapshot {
    pub payloads_sent: u64,
    pub chunks_sent: u64,
    pub retries: u64,
    pub failures: u64,
}

impl TransportStats {
    pub(crate) fn record_payload(&self) {
        self.payloads_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_chunk(&self) {
        self.chunks_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TransportStatsSnapshot {
        TransportStatsSnapshot {
            payloads_sent: self.payloads_sent.load(Ordering::Relaxed),
            chunks_sent: self.chunks_sent.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

//! Transport configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Payload bytes per chunk, matching the typical negotiated link MTU.
pub const DEFAULT_CHUNK_SIZE: usize = 20;

/// Pause between chunks of one payload.
pub const DEFAULT_INTER_CHUNK_DELAY: Duration = Duration::from_millis(6);

/// First retry delay after a busy chunk.
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(12);

/// Growth factor between successive retry delays.
pub const DEFAULT_RETRY_MULTIPLIER: f64 = 1.7;

/// Attempts per chunk, the first one included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Latest-wins send cadence.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// How long disconnect waits for an in-flight payload.
pub const DEFAULT_DISCONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Stopping notifications slower than this is logged.
pub const DEFAULT_NOTIFICATION_STOP_WARNING: Duration = Duration::from_secs(5);

/// How outbound payloads are buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Unbounded queue drained strictly in submission order.
    #[default]
    Fifo,
    /// Single pending slot; a newer payload replaces an unsent one. Sent on a ticker.
    LatestWins,
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WritePolicy::Fifo => f.write_str("fifo"),
            WritePolicy::LatestWins => f.write_str("latest"),
        }
    }
}

impl FromStr for WritePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" | "queue" => Ok(WritePolicy::Fifo),
            "latest" | "latest-wins" | "latest_wins" => Ok(WritePolicy::LatestWins),
            other => Err(format!("unknown write policy '{}' (expected fifo or latest)", other)),
        }
    }
}

/// Chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub inter_chunk_delay: Duration,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            inter_chunk_delay: DEFAULT_INTER_CHUNK_DELAY,
        }
    }
}

/// Bounded exponential backoff for busy chunks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based): `base * multiplier^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        if secs.is_finite() {
            Duration::from_secs_f64(secs.max(0.0))
        } else {
            Duration::MAX
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_RETRY_BASE_DELAY,
            multiplier: DEFAULT_RETRY_MULTIPLIER,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Configuration for [`RadioTransport`](super::RadioTransport).
#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    pub policy: WritePolicy,
    pub chunk: ChunkConfig,
    pub retry: RetryPolicy,
    /// Only used by [`WritePolicy::LatestWins`].
    pub tick_interval: Duration,
    pub disconnect_timeout: Duration,
    pub notification_stop_warning: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            policy: WritePolicy::default(),
            chunk: ChunkConfig::default(),
            retry: RetryPolicy::default(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            disconnect_timeout: DEFAULT_DISCONNECT_TIMEOUT,
            notification_stop_warning: DEFAULT_NOTIFICATION_STOP_WARNING,
        }
    }
}

impl TransportConfig {
    pub fn with_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }
}

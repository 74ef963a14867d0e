//! Rate-limit aware expense fetching.
//!
//! [`BackoffFetcher`] wraps [`ExpenseApi::list_expenses`]. A 429 response is
//! retried after `base_delay × 2^attempt` until the attempt counter reaches
//! `max_retries`; every other failure is returned immediately.
//!
//! With the defaults the schedule is:
//!
//! | Attempt | Sleep before next attempt |
//! |---------|---------------------------|
//! | 0       | 1 000 ms                  |
//! | 1       | 2 000 ms                  |
//! | 2       | 4 000 ms                  |
//! | 3       | none, terminal            |
//!
//! Overlapping calls are not de-duplicated; each runs its own chain.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;

use crate::api::{ApiError, Expense, ExpenseApi};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Retry bounds for rate-limited fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Attempt count at which a 429 becomes terminal.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryConfig {
    /// Delay to wait after a 429 at `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Whether a 429 at `attempt` may be retried automatically.
    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

/// Progress published while a fetch chain is waiting to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    Retrying {
        /// Attempt that was rate limited.
        attempt: u32,
        delay: Duration,
    },
}

impl FetchEvent {
    /// Human-readable status line.
    pub fn message(&self) -> String {
        match self {
            Self::Retrying { delay, .. } => format!(
                "Rate limit reached. Retrying in {} seconds...",
                format_seconds(*delay)
            ),
        }
    }
}

/// Terminal outcome of a fetch chain.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Still rate limited after exhausting automatic retries.
    #[error("Too many requests. Please try again later.")]
    TooManyRequests { attempt: u32 },

    /// Any non rate-limit failure. Never retried.
    #[error("Failed to fetch expenses. Please try again.")]
    Failed {
        attempt: u32,
        #[source]
        source: ApiError,
    },
}

impl FetchError {
    /// Attempt count reached by the chain; a manual retry resumes here.
    pub fn attempt(&self) -> u32 {
        match self {
            Self::TooManyRequests { attempt } | Self::Failed { attempt, .. } => *attempt,
        }
    }
}

/// Lists expenses, backing off on rate limits.
#[derive(Clone)]
pub struct BackoffFetcher {
    api: Arc<dyn ExpenseApi>,
    config: RetryConfig,
    events: broadcast::Sender<FetchEvent>,
}

impl BackoffFetcher {
    pub fn new(api: Arc<dyn ExpenseApi>, config: RetryConfig) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            api,
            config,
            events,
        }
    }

    pub fn config(&self) -> RetryConfig {
        self.config
    }

    /// Subscribe to retry status events.
    pub fn subscribe(&self) -> broadcast::Receiver<FetchEvent> {
        self.events.subscribe()
    }

    /// Fetch every expense, starting the retry counter at `start_attempt`.
    ///
    /// # Postconditions
    /// - `Err(TooManyRequests { attempt })` implies `attempt >= max_retries`
    /// - `Err(Failed { .. })` was produced by exactly one request after the
    ///   last backoff, with no retry of its own
    pub async fn fetch(&self, start_attempt: u32) -> Result<Vec<Expense>, FetchError> {
        let mut attempt = start_attempt;
        loop {
            match self.api.list_expenses().await {
                Ok(expenses) => {
                    tracing::debug!(attempt, count = expenses.len(), "Fetched expenses");
                    return Ok(expenses);
                }
                Err(err) if err.is_rate_limited() => {
                    if !self.config.can_retry(attempt) {
                        tracing::warn!(attempt, "Rate limited after all retries, giving up");
                        return Err(FetchError::TooManyRequests { attempt });
                    }
                    let delay = self.config.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limited, retrying after backoff"
                    );
                    // No subscribers is fine.
                    let _ = self.events.send(FetchEvent::Retrying { attempt, delay });
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(attempt, error = %err, "Error fetching expenses");
                    return Err(FetchError::Failed {
                        attempt,
                        source: err,
                    });
                }
            }
        }
    }
}

/// Render a delay in seconds the way the status line shows it ("1", "2.5").
fn format_seconds(delay: Duration) -> String {
    let millis = delay.as_millis();
    if millis % 1000 == 0 {
        (millis / 1000).to_string()
    } else {
        let secs = format!("{:.3}", delay.as_secs_f64());
        secs.trim_end_matches('0').to_string()
    }
}

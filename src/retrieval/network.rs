/*!
 * Timeouts, cancellation and bounded retry around network-bound stages.
 */

use log::warn;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::errors::RetrievalError;

/// Time budgets and retry settings for network stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkPolicy {
    /// Budget for a search or page request
    pub timeout: Duration,
    /// Budget for a whole archive download
    pub download_timeout: Duration,
    /// Additional attempts after the first failure
    pub retry_count: u32,
    /// Base backoff, doubled on each retry
    pub retry_backoff: Duration,
}

impl Default for NetworkPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(120),
            retry_count: 3,
            retry_backoff: Duration::from_millis(1000),
        }
    }
}

impl NetworkPolicy {
    /// Backoff before retry number `attempt` (1-based), with up to 25% jitter
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let base_ms = self.retry_backoff.as_millis() as u64;
        let scaled = base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(16));
        let jitter = if scaled >= 4 {
            rand::rng().random_range(0..=scaled / 4)
        } else {
            0
        };
        Duration::from_millis(scaled.saturating_add(jitter))
    }
}

/// Run `operation` under a time budget, aborting early on cancellation
pub async fn bounded<T, F>(
    stage: &'static str,
    limit: Duration,
    cancel: &CancellationToken,
    operation: F,
) -> Result<T, RetrievalError>
where
    F: Future<Output = Result<T, RetrievalError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RetrievalError::Cancelled),
        result = tokio::time::timeout(limit, operation) => match result {
            Ok(inner) => inner,
            Err(_) => Err(RetrievalError::Timeout { stage, secs: limit.as_secs() }),
        },
    }
}

/// Run a bounded operation, retrying retryable failures with exponential backoff
pub async fn with_retry<T, F, Fut>(
    stage: &'static str,
    limit: Duration,
    policy: &NetworkPolicy,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, RetrievalError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RetrievalError>>,
{
    let mut attempt = 0;

    loop {
        match bounded(stage, limit, cancel, operation()).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.retry_count => {
                attempt += 1;
                let delay = policy.backoff_for(attempt);
                warn!(
                    "{} failed ({}), retrying in {:?} (attempt {}/{})",
                    stage, e, delay, attempt, policy.retry_count
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(RetrievalError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(e) => return Err(e),
        }
    }
}

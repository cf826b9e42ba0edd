use crate::error::DigestResult;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Bounded retry: at most `attempts` tries with a fixed `delay` between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// Token refresh
    pub const AUTHENTICATION: RetryPolicy = RetryPolicy::new(5, Duration::from_millis(1000));
    /// Fetch, summarize and notify
    pub const STANDARD: RetryPolicy = RetryPolicy::new(3, Duration::from_millis(2000));

    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }
}

/// Runs a named pipeline step under a retry policy.
///
/// Implementations surface the last error once the attempts are exhausted.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute_step<T, F, Fut>(
        &self,
        name: &str,
        policy: RetryPolicy,
        action: F,
    ) -> DigestResult<T>
    where
        T: Send,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = DigestResult<T>> + Send;
}

/// Retries in-process, sleeping on the tokio timer between attempts
#[derive(Debug, Clone, Default)]
pub struct RetryingExecutor {
    skip_delays: bool,
}

impl RetryingExecutor {
    pub fn new() -> Self {
        Self { skip_delays: false }
    }

    /// Same attempt counts, no waiting between attempts
    pub fn without_delays() -> Self {
        Self { skip_delays: true }
    }
}

#[async_trait]
impl StepExecutor for RetryingExecutor {
    async fn execute_step<T, F, Fut>(
        &self,
        name: &str,
        policy: RetryPolicy,
        mut action: F,
    ) -> DigestResult<T>
    where
        T: Send,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = DigestResult<T>> + Send,
    {
        let attempts = policy.attempts.max(1);
        let mut attempt = 1;

        loop {
            match action().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!("Step {} succeeded on attempt {}/{}", name, attempt, attempts);
                    }
                    return Ok(value);
                }
                Err(e) if attempt < attempts => {
                    warn!(
                        "Step {} failed on attempt {}/{}: {} (retrying in {:?})",
                        name, attempt, attempts, e, policy.delay
                    );
                    if !self.skip_delays {
                        sleep(policy.delay).await;
                    }
                    attempt += 1;
                }
                Err(e) => {
                    error!("Step {} failed after {} attempt(s): {}", name, attempts, e);
                    return Err(e);
                }
            }
        }
    }
}

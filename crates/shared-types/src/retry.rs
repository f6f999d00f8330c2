//! # Retry Helpers
//!
//! Fixed-interval retry used by the cursor, the relay loop and the hub
//! client, built on [`backoff::future::retry_notify`]:
//!
//! - unbounded stages use [`Constant`]
//! - capped stages use [`ConstantWithMaxRetryCount`]
//! - errors are classified with [`backoff::Error::transient`] and
//!   [`backoff::Error::permanent`]

use backoff::backoff::{Backoff, Constant};
use std::future::Future;
use std::time::Duration;

/// Default backoff between attempts of a transient operation.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

/// Constant backoff that gives up after `max_retry_count` retries.
#[derive(Debug)]
pub struct ConstantWithMaxRetryCount {
    interval: Duration,
    max_retry_count: u32,
    count: u32,
}

impl ConstantWithMaxRetryCount {
    pub fn new(interval: Duration, max_retry_count: u32) -> Self {
        Self {
            interval,
            max_retry_count,
            count: 0,
        }
    }
}

impl Backoff for ConstantWithMaxRetryCount {
    fn next_backoff(&mut self) -> Option<Duration> {
        if self.count < self.max_retry_count {
            self.count += 1;
            Some(self.interval)
        } else {
            None
        }
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

/// Fixed backoff policy with an optional attempt cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBackoff {
    /// Sleep between attempts.
    pub delay: Duration,
    /// Maximum number of retries after the first attempt; `None` is unbounded.
    pub max_retries: Option<u32>,
}

impl Default for FixedBackoff {
    fn default() -> Self {
        Self::forever(DEFAULT_BACKOFF)
    }
}

impl FixedBackoff {
    /// Retry indefinitely.
    pub fn forever(delay: Duration) -> Self {
        Self {
            delay,
            max_retries: None,
        }
    }

    /// Retry at most `max_retries` times after the first attempt.
    pub fn limited(delay: Duration, max_retries: u32) -> Self {
        Self {
            delay,
            max_retries: Some(max_retries),
        }
    }

    /// Run `op` until it succeeds, `should_retry` rejects its error, or the
    /// retry budget is spent. `on_retry` observes each retried error with
    /// its 1-based retry number.
    pub async fn run<T, E, Op, Fut, Pred, Obs>(
        &self,
        op: Op,
        should_retry: Pred,
        on_retry: Obs,
    ) -> Result<T, E>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Pred: Fn(&E) -> bool,
        Obs: FnMut(u32, &E),
    {
        match self.max_retries {
            Some(max) => {
                retry_classified(
                    ConstantWithMaxRetryCount::new(self.delay, max),
                    op,
                    should_retry,
                    on_retry,
                )
                .await
            }
            None => retry_classified(Constant::new(self.delay), op, should_retry, on_retry).await,
        }
    }

    /// Run `op` until it succeeds, ignoring the retry cap. Used where the
    /// caller must not move on before the operation lands.
    pub async fn run_until_ok<T, E, Op, Fut, Obs>(&self, mut op: Op, mut on_retry: Obs) -> T
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Obs: FnMut(u32, &E),
    {
        let mut retries = 0u32;
        loop {
            // Every error is transient and `Constant` never stops, so only
            // `Ok` comes back.
            let outcome = retry_classified(
                Constant::new(self.delay),
                &mut op,
                |_: &E| true,
                |_, err: &E| {
                    retries = retries.saturating_add(1);
                    on_retry(retries, err);
                },
            )
            .await;
            if let Ok(value) = outcome {
                return value;
            }
        }
    }
}

async fn retry_classified<B, T, E, Op, Fut, Pred, Obs>(
    backoff: B,
    mut op: Op,
    should_retry: Pred,
    mut on_retry: Obs,
) -> Result<T, E>
where
    B: Backoff,
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    Pred: Fn(&E) -> bool,
    Obs: FnMut(u32, &E),
{
    let should_retry = &should_retry;
    let task = || {
        let attempt = op();
        async move {
            attempt.await.map_err(|err| {
                if should_retry(&err) {
                    backoff::Error::transient(err)
                } else {
                    backoff::Error::permanent(err)
                }
            })
        }
    };
    let mut retries = 0u32;
    let notify = |err: E, _: Duration| {
        retries += 1;
        on_retry(retries, &err);
    };
    backoff::future::retry_notify(backoff, task, notify).await
}

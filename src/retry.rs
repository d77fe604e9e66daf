//! Bounded retry with randomized waits.
//!
//! A probe is a single attempt that either yields a value, reports that the
//! value is not there yet (`Ok(None)`), or fails (`Err`). Both of the last
//! two are retried: each retry sleeps a duration drawn uniformly from
//! `[0.5 × wait_time, 1.5 × wait_time]` and consumes one unit of the budget.

use crate::error::Result;
use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub wait_time: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, wait_time: Duration) -> Self {
        Self {
            max_retries,
            wait_time,
        }
    }

    /// Runs `probe` until it yields a value or the budget is spent.
    ///
    /// `max_retries` retries means at most `max_retries + 1` attempts.
    /// Returns `None` once the budget is exhausted.
    pub async fn fetch_until<T, F, Fut>(&self, what: &str, mut probe: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let mut remaining = self.max_retries;
        let mut backoff = self.backoff();

        loop {
            match probe().await {
                Ok(Some(value)) => return Some(value),
                Ok(None) => debug!("{} not ready yet ({} retries left)", what, remaining),
                Err(e) => debug!("{} failed: {} ({} retries left)", what, e, remaining),
            }

            if remaining == 0 {
                return None;
            }
            remaining -= 1;

            let delay = backoff.next_backoff().unwrap_or(self.wait_time);
            tokio::time::sleep(delay).await;
        }
    }

    // Multiplier 1.0 keeps the interval constant; the randomization factor
    // spreads it over [0.5, 1.5] × wait_time.
    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.wait_time)
            .with_max_interval(self.wait_time)
            .with_multiplier(1.0)
            .with_randomization_factor(0.5)
            .with_max_elapsed_time(None)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComicScraperError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn quick(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn succeeds_on_fourth_probe() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let value = quick(3)
            .fetch_until("page count", move || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    Ok::<_, ComicScraperError>(if n == 4 { Some(n) } else { None })
                }
            })
            .await;

        assert_eq!(value, Some(4));
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn gives_up_after_budget() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let value: Option<()> = quick(2)
            .fetch_until("image", move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ComicScraperError>(None)
                }
            })
            .await;

        assert_eq!(value, None);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn errors_are_retried() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let value = quick(5)
            .fetch_until("viewer", move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(ComicScraperError::scraping("connection reset"))
                    } else {
                        Ok(Some("ok"))
                    }
                }
            })
            .await;

        assert_eq!(value, Some("ok"));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_budget_means_single_attempt() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let value: Option<()> = quick(0)
            .fetch_until("chapter", move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ComicScraperError>(None)
                }
            })
            .await;

        assert!(value.is_none());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn waits_stay_within_half_to_one_and_a_half() {
        let wait = Duration::from_millis(200);
        let mut backoff = RetryPolicy::new(10, wait).backoff();
        for _ in 0..200 {
            let delay = backoff.next_backoff().unwrap();
            assert!(delay >= Duration::from_millis(100), "{:?} too short", delay);
            assert!(delay <= Duration::from_millis(301), "{:?} too long", delay);
        }
    }
}

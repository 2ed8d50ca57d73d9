use crate::config::AppConfig;
use crate::model::ScraperError;
use crate::scraper::Scraper;

use rand::Rng;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Bounded retry with exponential backoff and random jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub jitter: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            base_backoff: Duration::from_millis(config.base_backoff_ms),
            jitter: Duration::from_millis(config.jitter_ms),
        }
    }

    /// Wait before the next attempt, given how many attempts already failed (1-based).
    pub fn delay_for(&self, failed_attempts: u32) -> Duration {
        let factor = 2u32.saturating_pow(failed_attempts.saturating_sub(1));
        let backoff = self.base_backoff.saturating_mul(factor);
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return backoff;
        }
        backoff + Duration::from_millis(rand::rng().random_range(0..jitter_ms))
    }

    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, ScraperError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ScraperError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "Attempt {}/{} for {} failed: {}. Retrying in {:?}",
                        attempt, self.max_attempts, label, e, delay
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

pub struct ScraperImpl {
    pub client: Client,
    pub retry: RetryPolicy,
}

impl ScraperImpl {
    pub fn new(config: &AppConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            retry: RetryPolicy::from_config(config),
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<String, ScraperError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::InvalidResponse(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[async_trait::async_trait]
impl Scraper for ScraperImpl {
    async fn fetch(&self, url: &str) -> Result<String, ScraperError> {
        debug!("GET {}", url);
        self.retry.run(url, || self.fetch_once(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_backoff: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_backoff: Duration::from_millis(100),
            jitter: Duration::ZERO,
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(4), Duration::from_millis(800));
    }

    #[test]
    fn jitter_stays_within_bound() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_backoff: Duration::from_millis(10),
            jitter: Duration::from_millis(5),
        };
        for _ in 0..50 {
            let d = policy.delay_for(1);
            assert!(d >= Duration::from_millis(10) && d < Duration::from_millis(15));
        }
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = instant_policy(3)
            .run("test", || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ScraperError::InvalidResponse(503))
                } else {
                    Ok("ok")
                }
            })
            .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = instant_policy(3)
            .run("test", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ScraperError::Timeout)
            })
            .await;
        assert!(matches!(result, Err(ScraperError::Timeout)));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = instant_policy(5)
            .run("test", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ScraperError::InvalidResponse(404))
            })
            .await;
        assert!(matches!(result, Err(ScraperError::InvalidResponse(404))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}

use crate::utils::error::{DeployError, Result};
use reqwest::Client;
use std::time::{Duration, Instant};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);
const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 反覆 GET 直到回應內容包含預期字串，或超過時限
#[derive(Debug, Clone)]
pub struct ReadinessPoller {
    client: Client,
    timeout: Duration,
    interval: Duration,
}

impl ReadinessPoller {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub async fn wait_for(&self, url: &str, expected: &str) -> Result<()> {
        let started = Instant::now();
        let mut attempts = 0u32;

        tracing::info!(
            "⏳ Waiting up to {}s for {} to return '{}'",
            self.timeout.as_secs(),
            url,
            expected
        );

        // 時限為 0 也至少送出一次請求
        loop {
            attempts += 1;
            let remaining = self.timeout.saturating_sub(started.elapsed());
            let request_timeout = remaining.clamp(MIN_REQUEST_TIMEOUT, MAX_REQUEST_TIMEOUT);

            match self.fetch_body(url, request_timeout).await {
                Ok(body) if body.contains(expected) => {
                    tracing::info!(
                        "✅ {} is ready after {} attempt(s) ({:?})",
                        url,
                        attempts,
                        started.elapsed()
                    );
                    return Ok(());
                }
                Ok(_) => tracing::debug!("Attempt {}: {} answered without the marker", attempts, url),
                Err(e) => tracing::debug!("Attempt {}: {} not ready yet: {}", attempts, url, e),
            }

            let remaining = self.timeout.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                break;
            }
            tokio::time::sleep(self.interval.min(remaining)).await;
        }

        tracing::warn!("⌛ Gave up on {} after {} attempt(s)", url, attempts);
        Err(DeployError::Timeout {
            url: url.to_string(),
            elapsed_secs: started.elapsed().as_secs(),
        })
    }

    async fn fetch_body(&self, url: &str, request_timeout: Duration) -> Result<String> {
        let response = self
            .client
            .get(url)
            .timeout(request_timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

/// 以預設間隔輪詢，`timeout_secs` 秒內沒等到就回傳 `Timeout`
pub async fn wait_for_app_ready(url: &str, expected: &str, timeout_secs: u64) -> Result<()> {
    ReadinessPoller::new(Duration::from_secs(timeout_secs))
        .wait_for(url, expected)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn fast_poller(timeout_ms: u64) -> ReadinessPoller {
        ReadinessPoller::new(Duration::from_millis(timeout_ms))
            .with_interval(Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_ready_on_first_attempt() {
        let server = MockServer::start();
        let site = server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200).body("<html>Hello PHP!</html>");
        });

        let result = fast_poller(2_000).wait_for(&server.url("/"), "Hello PHP!").await;

        assert!(result.is_ok());
        site.assert_hits(1);
    }

    #[tokio::test]
    async fn test_zero_timeout_still_makes_one_request() {
        let server = MockServer::start();
        let site = server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200).body("Hello, Python!");
        });

        let result = wait_for_app_ready(&server.url("/"), "Hello, Python!", 0).await;

        assert!(result.is_ok());
        site.assert_hits(1);
    }

    #[tokio::test]
    async fn test_zero_timeout_fails_after_single_attempt() {
        let server = MockServer::start();
        let site = server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(503);
        });

        let result = fast_poller(0).wait_for(&server.url("/"), "Hello PHP!").await;

        assert!(matches!(result, Err(DeployError::Timeout { .. })));
        site.assert_hits(1);
    }

    #[tokio::test]
    async fn test_error_status_is_retried_until_timeout() {
        let server = MockServer::start();
        let site = server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(503).body("Hello NodeJS!");
        });

        let err = fast_poller(400)
            .wait_for(&server.url("/"), "Hello NodeJS!")
            .await
            .unwrap_err();

        match err {
            DeployError::Timeout { url, .. } => assert_eq!(url, server.url("/")),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(site.hits() > 1);
    }

    #[tokio::test]
    async fn test_body_without_marker_times_out() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200).body("Your App Service app is up and running");
        });

        let result = fast_poller(300)
            .wait_for(&server.url("/"), "Hello, Python!")
            .await;

        assert!(matches!(result, Err(DeployError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_connection_refused_is_tolerated() {
        // 127.0.0.1:1 通常沒有服務在聽
        let result = fast_poller(300)
            .wait_for("http://127.0.0.1:1/", "Hello NodeJS!")
            .await;

        assert!(matches!(result, Err(DeployError::Timeout { .. })));
    }
}

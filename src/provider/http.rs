//! Shared HTTP plumbing for provider adapters

use reqwest::{Client, Response};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{AppError, Result};

/// Build a client with the provider's timeout, or `default_timeout`
pub(crate) fn build_client(config: &ProviderConfig, default_timeout: Duration) -> Result<Client> {
    let timeout = config
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(default_timeout);

    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Provider(format!("Failed to create HTTP client: {}", e)))
}

/// Configured API root without a trailing slash
pub(crate) fn base_url(config: &ProviderConfig, default: &str) -> String {
    config
        .base_url
        .as_deref()
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}

/// Credential or `MissingCredential`
pub(crate) fn require_key(config: &ProviderConfig) -> Result<String> {
    config
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::MissingCredential(config.name.clone()))
}

/// Turn a non-2xx response into a provider error carrying the body
pub(crate) async fn ensure_success(provider: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AppError::Provider(format!(
        "{} returned {}: {}",
        provider, status, body
    )))
}

/// Fetch the image behind a result URL
pub(crate) async fn download(client: &Client, provider: &str, url: &str) -> Result<Vec<u8>> {
    debug!(provider = %provider, url = %url, "Downloading generated image");

    let response = ensure_success(provider, client.get(url).send().await?).await?;
    Ok(response.bytes().await?.to_vec())
}

/// State reported by one poll of an asynchronous job
#[derive(Debug)]
pub(crate) enum PollStatus<T> {
    Pending,
    Ready(T),
    Failed(String),
}

/// Fixed-interval, bounded polling schedule
#[derive(Debug, Clone, Copy)]
pub(crate) struct PollSchedule {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollSchedule {
    pub fn from_config(config: &ProviderConfig, interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval: config
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(interval),
            max_attempts: config.max_poll_attempts.unwrap_or(max_attempts),
        }
    }

    /// Sleep, then check, until the job settles or attempts run out
    pub async fn run<T, F, Fut>(&self, provider: &str, mut check: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<PollStatus<T>>>,
    {
        for attempt in 1..=self.max_attempts {
            tokio::time::sleep(self.interval).await;

            match check().await? {
                PollStatus::Ready(value) => return Ok(value),
                PollStatus::Failed(reason) => {
                    return Err(AppError::Provider(format!(
                        "{} job failed: {}",
                        provider, reason
                    )));
                }
                PollStatus::Pending => {
                    debug!(provider = %provider, attempt, "Job still pending");
                }
            }
        }

        Err(AppError::Timeout(format!(
            "{} job not finished after {} polls",
            provider, self.max_attempts
        )))
    }
}

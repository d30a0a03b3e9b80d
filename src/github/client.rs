use reqwest::{header, Client, Response, StatusCode};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::error::{Error, Result};
use crate::github::rate_limit::RateBudget;

/// Outcome of one logical fetch, after all retries have been spent.
#[derive(Debug)]
pub enum FetchOutcome {
    /// HTTP 200 with the raw response body.
    Success(String),
    /// HTTP 404: the resource is permanently absent, never retried.
    NotFound,
    /// Retries exhausted; carries the last error seen.
    Failed(Error),
}

/// Retry/backoff knobs. Tests shrink `backoff_unit` to keep sleeps short.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
    pub reset_pad: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_unit: Duration::from_secs(1),
            reset_pad: Duration::from_secs(5),
        }
    }
}

pub struct GitHubClient {
    client: Client,
    base_url: String,
    budget: Mutex<RateBudget>,
    policy: RetryPolicy,
}

impl GitHubClient {
    pub fn new(token: Option<&str>) -> Result<Self> {
        Self::with_base_url(token, "https://api.github.com", RetryPolicy::default())
    }

    pub fn with_base_url(
        token: Option<&str>,
        base_url: impl Into<String>,
        policy: RetryPolicy,
    ) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("issuecrawler/0.1"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            budget: Mutex::new(RateBudget::new()),
            policy,
        })
    }

    /// Fetch `path` with bounded retries, exponential backoff and
    /// rate-limit-aware pausing. All retry policy lives here; callers act
    /// on the outcome but never retry transport failures themselves.
    pub async fn fetch(&self, path: &str) -> FetchOutcome {
        let url = format!("{}{}", self.base_url, path);
        let mut last_error: Option<Error> = None;

        for attempt in 0..self.policy.max_attempts {
            let response = match self.client.get(&url).send().await {
                Ok(response) => response,
                Err(e) => {
                    if is_rate_limit_error(&e) {
                        self.sleep_until_reset().await;
                        last_error = Some(Error::Network(e));
                        continue;
                    }
                    tracing::warn!(
                        "Request error on {}: {} (attempt {}/{})",
                        url,
                        e,
                        attempt + 1,
                        self.policy.max_attempts
                    );
                    last_error = Some(Error::Network(e));
                    self.backoff(attempt).await;
                    continue;
                }
            };

            self.observe_headers(&response).await;
            let status = response.status();

            if status == StatusCode::NOT_FOUND {
                return FetchOutcome::NotFound;
            }

            if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
                let wait = { self.budget.lock().await.cooldown(epoch_now()) };
                if !wait.is_zero() {
                    tracing::warn!("Rate limited (HTTP {}). Sleeping {:?}...", status, wait);
                    sleep(wait).await;
                }
                last_error = Some(Error::GitHubApi(format!("HTTP {} (rate limited)", status)));
                continue;
            }

            if !status.is_success() {
                tracing::warn!(
                    "HTTP {} on {} (attempt {}/{})",
                    status,
                    url,
                    attempt + 1,
                    self.policy.max_attempts
                );
                last_error = Some(Error::GitHubApi(format!("HTTP {} on {}", status, url)));
                self.backoff(attempt).await;
                continue;
            }

            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(
                        "Failed to read body from {}: {} (attempt {}/{})",
                        url,
                        e,
                        attempt + 1,
                        self.policy.max_attempts
                    );
                    last_error = Some(Error::Network(e));
                    self.backoff(attempt).await;
                    continue;
                }
            };

            // Pace proactively before the quota actually runs out.
            let pause = {
                let budget = self.budget.lock().await;
                budget
                    .should_pause(epoch_now())
                    .map(|wait| (wait, budget.remaining()))
            };
            if let Some((wait, remaining)) = pause {
                tracing::info!(
                    "Rate limit low ({:?} remaining). Sleeping {:?}...",
                    remaining,
                    wait
                );
                sleep(wait).await;
            }

            return FetchOutcome::Success(body);
        }

        FetchOutcome::Failed(last_error.unwrap_or_else(|| {
            Error::GitHubApi(format!(
                "Failed after {} attempts: {}",
                self.policy.max_attempts, url
            ))
        }))
    }

    async fn observe_headers(&self, response: &Response) {
        let remaining = header_value(response, "x-ratelimit-remaining");
        let reset = header_value(response, "x-ratelimit-reset");
        self.budget.lock().await.observe(remaining, reset);
    }

    async fn backoff(&self, attempt: u32) {
        let wait = self.policy.backoff_unit * 2u32.saturating_pow(attempt);
        tracing::debug!("Backing off {:?}...", wait);
        sleep(wait).await;
    }

    /// Ask `/rate_limit` for the authoritative core reset time and sleep
    /// past it. Used when the transport layer itself reports a rate limit.
    async fn sleep_until_reset(&self) {
        let reset = match self.lookup_reset().await {
            Ok(reset) => reset,
            Err(e) => {
                tracing::warn!("Could not query /rate_limit: {}", e);
                self.backoff(0).await;
                return;
            }
        };
        let wait = Duration::from_secs(reset.saturating_sub(epoch_now())) + self.policy.reset_pad;
        tracing::warn!("Rate limited at transport level. Sleeping {:?}...", wait);
        sleep(wait).await;
    }

    async fn lookup_reset(&self) -> Result<u64> {
        let url = format!("{}/rate_limit", self.base_url);
        let body: serde_json::Value = self.client.get(&url).send().await?.json().await?;
        body["resources"]["core"]["reset"]
            .as_u64()
            .ok_or_else(|| Error::ParseError("no core reset in /rate_limit".to_string()))
    }
}

fn header_value<T: std::str::FromStr>(response: &Response, name: &str) -> Option<T> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

fn is_rate_limit_error(error: &reqwest::Error) -> bool {
    error.to_string().to_lowercase().contains("rate limit")
}

fn epoch_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

use crate::config::Settings;
use crate::market::signal::RawSignal;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PATH: &str = "/v1/signals";
const DEFAULT_RETRIES: u32 = 2;
const RETRY_BACKOFF: Duration = Duration::from_millis(250);
const MAX_CODES_PER_SIGNAL: usize = 3;

/// Source of coded market signals. Implementations own any I/O policy (timeouts, retries);
/// callers treat a failure as "no market data".
#[async_trait::async_trait]
pub trait MarketFeed: Send + Sync {
    fn feed_name(&self) -> &'static str;

    async fn fetch_signals(&self) -> Result<Vec<RawSignal>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalsResponse {
    pub signals: Vec<RawSignal>,
}

#[derive(Debug, Clone)]
pub struct HttpJsonMarketFeed {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    path: String,
    retries: u32,
}

impl HttpJsonMarketFeed {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_market_feed_base_url()?.to_string();
        let api_key = settings.market_feed_api_key.clone();

        let timeout_secs = std::env::var("MARKET_FEED_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("MARKET_FEED_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        let path = std::env::var("MARKET_FEED_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build market feed http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            path,
            retries,
        })
    }

    fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn fetch_once(&self) -> Result<Vec<RawSignal>> {
        let res = self
            .http
            .get(self.url())
            .headers(self.headers()?)
            .send()
            .await
            .context("market feed request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read market feed response")?;

        if !status.is_success() {
            anyhow::bail!("market feed HTTP {status}: {text}");
        }

        parse_signals(&text)
    }
}

#[async_trait::async_trait]
impl MarketFeed for HttpJsonMarketFeed {
    fn feed_name(&self) -> &'static str {
        "http_json"
    }

    async fn fetch_signals(&self) -> Result<Vec<RawSignal>> {
        with_retries(self.retries.max(1), RETRY_BACKOFF, || self.fetch_once()).await
    }
}

/// Runs `op` up to `attempts` times, doubling the sleep after each failure. The last error wins.
async fn with_retries<T, F, Fut>(attempts: u32, backoff: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= attempts {
                    return Err(err);
                }
                let delay = backoff * (1 << (attempt - 1));
                tracing::warn!(attempt, ?delay, error = %err, "market feed fetch failed; retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Fixed signal list. Used when no feed is configured and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticMarketFeed {
    signals: Vec<RawSignal>,
}

impl StaticMarketFeed {
    pub fn new(signals: Vec<RawSignal>) -> Self {
        Self { signals }
    }
}

#[async_trait::async_trait]
impl MarketFeed for StaticMarketFeed {
    fn feed_name(&self) -> &'static str {
        "static"
    }

    async fn fetch_signals(&self) -> Result<Vec<RawSignal>> {
        Ok(self.signals.clone())
    }
}

pub fn parse_signals(text: &str) -> Result<Vec<RawSignal>> {
    let parsed = serde_json::from_str::<SignalsResponse>(text)
        .with_context(|| format!("market feed response is not a signals document: {text}"))?;

    for (i, signal) in parsed.signals.iter().enumerate() {
        anyhow::ensure!(
            signal.0.len() <= MAX_CODES_PER_SIGNAL,
            "signal {i} has {} codes (max {MAX_CODES_PER_SIGNAL})",
            signal.0.len()
        );
    }

    Ok(parsed.signals)
}

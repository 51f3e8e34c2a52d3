//! Cached USD→VND exchange rate for display quotes.
//!
//! The live rate is only used to show foreign registrants a USD-equivalent price; signed gateway amounts use
//! the fixed constant in [`crate::fees`]. The cache is process-wide: one instance is constructed at startup and
//! shared by reference. Refreshes are serialized through the internal mutex, so concurrent expiry triggers at
//! most one outbound fetch and the rest wait for its result.

use std::{collections::HashMap, sync::Arc, time::Duration as StdDuration};

use chrono::{DateTime, Duration, NaiveTime, Utc};
use log::*;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;

const RATE_ENDPOINT: &str = "https://open.er-api.com/v6/latest/USD";
/// Fallback used until the first successful fetch, and kept when every fetch fails.
const DEFAULT_VND_PER_USD: f64 = 25_995.239187;
/// How soon to retry after a failed refresh.
const RETRY_TTL: Duration = Duration::minutes(30);
const FETCH_TIMEOUT: StdDuration = StdDuration::from_secs(10);

#[derive(Debug, Clone, Error)]
pub enum ExchangeRateError {
    #[error("Exchange rate request failed: {0}")]
    RequestFailed(String),
    #[error("Exchange rate response was malformed: {0}")]
    MalformedResponse(String),
    #[error("The exchange rate feed did not include a VND rate")]
    RateMissing,
}

#[derive(Debug, Deserialize)]
struct RateFeedResponse {
    result: String,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

#[derive(Debug, Clone, Copy)]
struct CachedRate {
    vnd_per_usd: f64,
    expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ExchangeRateCache {
    client: reqwest::Client,
    state: Arc<Mutex<CachedRate>>,
}

impl Default for ExchangeRateCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ExchangeRateCache {
    pub fn new() -> Self {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build().unwrap_or_default();
        // Expired from the start, so the first caller triggers a fetch
        let seed = CachedRate { vnd_per_usd: DEFAULT_VND_PER_USD, expires_at: Utc::now() - Duration::minutes(1) };
        Self { client, state: Arc::new(Mutex::new(seed)) }
    }

    /// A cache pre-loaded with a fixed rate and expiry. Tests use this to avoid network traffic.
    pub fn with_rate(vnd_per_usd: f64, expires_at: DateTime<Utc>) -> Self {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build().unwrap_or_default();
        Self { client, state: Arc::new(Mutex::new(CachedRate { vnd_per_usd, expires_at })) }
    }

    /// The current VND-per-USD rate.
    ///
    /// Returns the cached value while it is fresh. On expiry, the calling task refreshes it; a failed refresh
    /// logs the error, keeps the stale value and backs off for [`RETRY_TTL`]. This method never fails; a stale
    /// display rate beats a failed quote.
    pub async fn vnd_per_usd(&self, now: DateTime<Utc>) -> f64 {
        let mut cached = self.state.lock().await;
        if now < cached.expires_at {
            return cached.vnd_per_usd;
        }
        match self.fetch_rate().await {
            Ok(rate) => {
                debug!("💱️ Refreshed USD→VND rate: {rate}");
                cached.vnd_per_usd = rate;
                cached.expires_at = next_utc_midnight(now);
            },
            Err(e) => {
                warn!("💱️ Could not refresh the USD→VND rate ({e}). Keeping {} for now.", cached.vnd_per_usd);
                cached.expires_at = now + RETRY_TTL;
            },
        }
        cached.vnd_per_usd
    }

    async fn fetch_rate(&self) -> Result<f64, ExchangeRateError> {
        let response = self
            .client
            .get(RATE_ENDPOINT)
            .send()
            .await
            .map_err(|e| ExchangeRateError::RequestFailed(e.to_string()))?;
        let feed = response
            .json::<RateFeedResponse>()
            .await
            .map_err(|e| ExchangeRateError::MalformedResponse(e.to_string()))?;
        if feed.result != "success" {
            return Err(ExchangeRateError::RequestFailed(format!("feed reported '{}'", feed.result)));
        }
        feed.rates.get("VND").copied().ok_or(ExchangeRateError::RateMissing)
    }
}

/// Midnight at the start of the next UTC day; rates are refreshed daily on success.
fn next_utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    (now + Duration::days(1)).date_naive().and_time(NaiveTime::MIN).and_utc()
}

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::core::config::ProviderConfig;
use crate::core::rates::{RateProvider, RateSnapshot, RateTable};

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    license: String,
    timestamp: i64,
    #[serde(default)]
    base: Option<String>,
    rates: RateTable,
}

/// Fetches the latest rate table from an openexchangerates.org compatible endpoint.
pub struct OpenExchangeRatesProvider {
    endpoint: String,
    app_id: Option<String>,
    timeout: Duration,
}

impl OpenExchangeRatesProvider {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        OpenExchangeRatesProvider {
            endpoint: endpoint.to_string(),
            app_id: None,
            timeout,
        }
    }

    pub fn with_app_id(mut self, app_id: &str) -> Self {
        self.app_id = Some(app_id.to_string());
        self
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        let provider = Self::new(&config.endpoint, config.timeout());
        match config.app_id.as_deref() {
            Some(app_id) => provider.with_app_id(app_id),
            None => provider,
        }
    }

    fn request_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint)
            .with_context(|| format!("Invalid rates endpoint: {}", self.endpoint))?;
        if let Some(app_id) = &self.app_id {
            url.query_pairs_mut().append_pair("app_id", app_id);
        }
        Ok(url)
    }

    /// Single attempt at downloading and parsing the rate table.
    pub async fn try_fetch(&self) -> Result<RateSnapshot> {
        let url = self.request_url()?;
        debug!("Requesting latest rates from {}", self.endpoint);

        let client = reqwest::Client::builder()
            .user_agent("fxconv/1.0")
            .timeout(self.timeout)
            .build()?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for endpoint: {}", e, self.endpoint))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for endpoint: {}",
                response.status(),
                self.endpoint
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| anyhow!("Failed to read response from {}: {}", self.endpoint, e))?;

        let data: LatestRatesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response from {}: {}", self.endpoint, e))?;

        to_snapshot(data)
    }
}

fn to_snapshot(data: LatestRatesResponse) -> Result<RateSnapshot> {
    if let Some(currency) = data.rates.find_invalid() {
        return Err(anyhow!(
            "Invalid rate for {}: {}",
            currency,
            data.rates.get(currency)
        ));
    }

    let timestamp = Utc
        .timestamp_opt(data.timestamp, 0)
        .single()
        .ok_or_else(|| anyhow!("Invalid rate timestamp: {}", data.timestamp))?;

    let mut snapshot = RateSnapshot::new(data.rates, timestamp, data.license);
    snapshot.base = data.base;
    Ok(snapshot)
}

#[async_trait]
impl RateProvider for OpenExchangeRatesProvider {
    #[instrument(name = "RatesFetch", skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch_latest(&self) -> RateSnapshot {
        match self.try_fetch().await {
            Ok(snapshot) => {
                debug!(timestamp = ?snapshot.timestamp, "Received rate snapshot");
                snapshot
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch exchange rates");
                RateSnapshot::empty()
            }
        }
    }
}

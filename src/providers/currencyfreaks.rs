use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::core::config::ProviderConfig;
use crate::core::currency::{
    CatalogProvider, CurrencyCatalog, CurrencyCode, CurrencyRateProvider,
};
use crate::core::error::FetchError;

/// Client for the CurrencyFreaks rate service.
///
/// Holds a single `reqwest::Client`; connection pooling and timeouts are left
/// to it. Nothing is cached, every call hits the network.
pub struct CurrencyFreaksProvider {
    catalog_url: Url,
    rates_url: Url,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl CurrencyFreaksProvider {
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/');
        let endpoint = |suffix: &str| {
            Url::parse(&format!("{base_url}{suffix}"))
                .with_context(|| format!("Invalid rate service URL: '{base_url}'"))
        };
        let catalog_url = endpoint("/supported-currencies")?;
        let rates_url = endpoint("/rates/latest")?;

        let client = reqwest::Client::builder()
            .user_agent("fxcalc/1.0")
            .timeout(timeout)
            .build()?;
        Ok(CurrencyFreaksProvider {
            catalog_url,
            rates_url,
            api_key: api_key.map(str::to_string),
            client,
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            config.api_key.as_deref(),
            config.timeout(),
        )
    }

    /// Sends a GET and returns the trimmed body of a successful response.
    async fn get_text(&self, url: Url) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Response(format!("HTTP {status}")));
        }

        let text = response.text().await?;
        Ok(text.trim().to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SupportedCurrenciesResponse {
    supported_currencies_map: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: Map<String, Value>,
}

fn parse_catalog(text: &str) -> Result<CurrencyCatalog, FetchError> {
    let data: SupportedCurrenciesResponse = serde_json::from_str(text)
        .map_err(|e| FetchError::Response(format!("Invalid currency list: {e}")))?;

    let codes = data
        .supported_currencies_map
        .into_iter()
        .filter_map(|(key, _)| match CurrencyCode::new(key) {
            Ok(code) => Some(code),
            Err(e) => {
                warn!("Skipping catalog entry: {}", e);
                None
            }
        });
    let catalog = CurrencyCatalog::new(codes);

    if catalog.is_empty() {
        return Err(FetchError::Response(
            "No supported currencies listed".to_string(),
        ));
    }
    Ok(catalog)
}

/// The live service quotes rates as strings, so numeric strings are accepted
/// alongside plain numbers.
fn parse_rate(text: &str, target: &CurrencyCode) -> Result<f64, FetchError> {
    let data: LatestRatesResponse =
        serde_json::from_str(text).map_err(|e| FetchError::Parse(e.to_string()))?;

    let value = data
        .rates
        .get(target.as_str())
        .ok_or_else(|| FetchError::Parse(format!("No rate found for {target}")))?;

    let rate = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| FetchError::Parse(format!("Rate for {target} is not a number: {value}")))?;

    if !rate.is_finite() || rate < 0.0 {
        return Err(FetchError::Parse(format!(
            "Rate for {target} is out of range: {rate}"
        )));
    }
    Ok(rate)
}

#[async_trait]
impl CatalogProvider for CurrencyFreaksProvider {
    #[instrument(name = "CatalogFetch", skip(self))]
    async fn fetch_catalog(&self) -> Result<CurrencyCatalog, FetchError> {
        debug!("Requesting supported currencies from {}", self.catalog_url);

        let text = self.get_text(self.catalog_url.clone()).await?;
        if text.is_empty() {
            return Err(FetchError::Response("Empty response body".to_string()));
        }
        let catalog = parse_catalog(&text)?;

        debug!("Received {} supported currencies", catalog.len());
        Ok(catalog)
    }
}

#[async_trait]
impl CurrencyRateProvider for CurrencyFreaksProvider {
    #[instrument(
        name = "RateFetch",
        skip(self),
        fields(source = %source, target = %target)
    )]
    async fn fetch_rate(
        &self,
        source: &CurrencyCode,
        target: &CurrencyCode,
    ) -> Result<f64, FetchError> {
        let mut url = self.rates_url.clone();
        {
            let mut query = url.query_pairs_mut();
            if let Some(key) = &self.api_key {
                query.append_pair("apikey", key);
            }
            query
                .append_pair("symbols", target.as_str())
                .append_pair("base", source.as_str());
        }
        debug!("Requesting exchange rate from {}", self.rates_url);

        let text = self.get_text(url).await?;
        if text.is_empty() {
            return Err(FetchError::EmptyBody);
        }
        let rate = parse_rate(&text, target)?;

        debug!(rate, "Received exchange rate");
        Ok(rate)
    }
}

use crate::domain::ports::CurrencyConverter;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::Mutex;

pub const DEFAULT_RATES_ENDPOINT: &str = "https://www.cbr-xml-daily.ru/daily_json.js";

/// Fixed code → rate table.
#[derive(Debug, Clone, Default)]
pub struct StaticRates {
    rates: HashMap<String, f64>,
}

impl StaticRates {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        let rates = rates
            .into_iter()
            .map(|(code, rate)| (code.to_uppercase(), rate))
            .collect();
        Self { rates }
    }

    pub fn from_pairs(pairs: &[(&str, f64)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|(code, rate)| (code.to_string(), *rate))
                .collect(),
        )
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.rates.get(&code.to_uppercase()).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[async_trait]
impl CurrencyConverter for StaticRates {
    async fn rate(&self, code: &str) -> Result<f64> {
        self.get(code).ok_or_else(|| EtlError::ConversionError {
            currency: code.to_string(),
            message: "no static rate configured".to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct DailyRates {
    #[serde(rename = "Valute")]
    valute: HashMap<String, CbrQuote>,
}

#[derive(Debug, Deserialize)]
struct CbrQuote {
    #[serde(rename = "Nominal")]
    nominal: f64,
    #[serde(rename = "Value")]
    value: f64,
}

/// Rates from the Central Bank of Russia daily table. The table is fetched
/// once and reused for the lifetime of the provider.
pub struct CbrRateProvider {
    client: Client,
    endpoint: String,
    overrides: StaticRates,
    table: Mutex<Option<HashMap<String, f64>>>,
}

impl CbrRateProvider {
    pub fn new(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            overrides: StaticRates::default(),
            table: Mutex::new(None),
        }
    }

    /// Configured rates win over the downloaded table.
    pub fn with_overrides(mut self, overrides: StaticRates) -> Self {
        self.overrides = overrides;
        self
    }

    async fn download(&self) -> Result<HashMap<String, f64>> {
        tracing::debug!("Fetching currency rates from: {}", self.endpoint);
        let response = self.client.get(&self.endpoint).send().await?;

        if !response.status().is_success() {
            return Err(EtlError::ConversionError {
                currency: "*".to_string(),
                message: format!("rate service returned {}", response.status()),
            });
        }

        let daily: DailyRates = response.json().await?;
        let table = daily
            .valute
            .into_iter()
            .filter(|(_, quote)| quote.nominal > 0.0)
            .map(|(code, quote)| (code.to_uppercase(), quote.value / quote.nominal))
            .collect::<HashMap<_, _>>();

        tracing::debug!("Loaded {} currency rates", table.len());
        Ok(table)
    }
}

#[async_trait]
impl CurrencyConverter for CbrRateProvider {
    async fn rate(&self, code: &str) -> Result<f64> {
        if let Some(rate) = self.overrides.get(code) {
            return Ok(rate);
        }

        let mut table = self.table.lock().await;
        if table.is_none() {
            let downloaded = self.download().await.map_err(|e| match e {
                EtlError::ConversionError { message, .. } => EtlError::ConversionError {
                    currency: code.to_string(),
                    message,
                },
                other => EtlError::ConversionError {
                    currency: code.to_string(),
                    message: other.to_string(),
                },
            })?;
            *table = Some(downloaded);
        }

        table
            .as_ref()
            .and_then(|rates| rates.get(&code.to_uppercase()).copied())
            .ok_or_else(|| EtlError::ConversionError {
                currency: code.to_string(),
                message: "currency not listed by the rate service".to_string(),
            })
    }
}

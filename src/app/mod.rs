// Wiring: turns a validated config into a ready session and stores.

use crate::adapters::currency::{CbrRateProvider, StaticRates};
use crate::adapters::headhunter::HeadHunterSource;
use crate::adapters::storage::{CsvPostingStore, JsonLinesPostingStore};
use crate::adapters::superjob::{self, SuperJobSource};
use crate::config::TomlConfig;
use crate::core::aggregator::SearchSession;
use crate::core::normalizer::Normalizer;
use crate::domain::ports::{PostingStore, VacancySource};
use crate::utils::error::Result;
use reqwest::Client;
use std::sync::Arc;

pub fn http_client() -> Result<Client> {
    let client = Client::builder()
        .user_agent(concat!("vacancy-etl/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Sources are listed SuperJob first, HeadHunter second; equal sort keys
/// keep this order.
pub fn build_session(config: &TomlConfig, client: Client) -> SearchSession {
    let api_key = config.superjob_api_key();
    if api_key.is_none() {
        tracing::warn!(
            "⚠️ {} is not set, SuperJob searches will fail",
            superjob::API_KEY_ENV
        );
    }

    let sources: Vec<Arc<dyn VacancySource>> = vec![
        Arc::new(SuperJobSource::new(
            client.clone(),
            &config.sources.superjob.endpoint,
            config.sources.superjob.count,
            api_key,
        )),
        Arc::new(HeadHunterSource::new(
            client.clone(),
            &config.sources.headhunter.endpoint,
            config.sources.headhunter.per_page,
            config.sources.headhunter.only_with_salary,
        )),
    ];

    let rates = CbrRateProvider::new(client, &config.currency.endpoint)
        .with_overrides(StaticRates::new(config.currency.rates.clone()));
    let normalizer = Normalizer::new(Arc::new(rates), config.currency.base_codes.clone());

    SearchSession::new(
        sources,
        normalizer,
        config.search.concurrent_requests,
        config.search_mode(),
    )
}

pub fn build_stores(config: &TomlConfig) -> Vec<Box<dyn PostingStore>> {
    vec![
        Box::new(CsvPostingStore::new(config.csv_path())),
        Box::new(JsonLinesPostingStore::new(config.json_path())),
    ]
}

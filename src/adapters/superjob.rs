use crate::adapters::records_under;
use crate::domain::model::RawRecord;
use crate::domain::ports::VacancySource;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;

pub const SOURCE_NAME: &str = "superjob";
pub const DEFAULT_ENDPOINT: &str = "https://api.superjob.ru/2.0/vacancies/";
pub const API_KEY_ENV: &str = "API_SUPERJOB_KEY";
const API_KEY_HEADER: &str = "X-Api-App-Id";

pub struct SuperJobSource {
    client: Client,
    endpoint: String,
    count: usize,
    api_key: Option<String>,
}

impl SuperJobSource {
    pub fn new(client: Client, endpoint: &str, count: usize, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            count,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }
}

#[async_trait]
impl VacancySource for SuperJobSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, query: &str) -> Result<Vec<RawRecord>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| EtlError::MissingConfigError {
                field: format!("sources.superjob.api_key ({})", API_KEY_ENV),
            })?;

        tracing::debug!("Making SuperJob request to: {} (keywords={})", self.endpoint, query);

        let count = self.count.to_string();
        // srws=1: 只比對職稱
        let response = self
            .client
            .get(&self.endpoint)
            .header(API_KEY_HEADER, api_key)
            .query(&[
                ("keywords[0][srws]", "1"),
                ("keywords[0][keys]", query),
                ("count", count.as_str()),
            ])
            .send()
            .await
            .map_err(|e| EtlError::fetch(SOURCE_NAME, e.to_string()))?;

        tracing::debug!("SuperJob response status: {}", response.status());
        if !response.status().is_success() {
            return Err(EtlError::fetch(
                SOURCE_NAME,
                format!("unexpected status {}", response.status()),
            ));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| EtlError::fetch(SOURCE_NAME, format!("invalid body: {}", e)))?;

        Ok(records_under(body, "objects", SOURCE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_fetch_sends_key_and_keywords() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/2.0/vacancies/")
                .header("x-api-app-id", "secret-key")
                .query_param("keywords[0][srws]", "1")
                .query_param("keywords[0][keys]", "Engineer")
                .query_param("count", "50");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "objects": [
                        {"profession": "Engineer", "link": "https://superjob.ru/1", "payment_from": 1000}
                    ],
                    "total": 1
                }));
        });

        let source = SuperJobSource::new(
            Client::new(),
            &server.url("/2.0/vacancies/"),
            50,
            Some("secret-key".to_string()),
        );
        let records = source.fetch("Engineer").await.unwrap();

        api_mock.assert();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, SOURCE_NAME);
        assert_eq!(records[0].data["profession"], "Engineer");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/2.0/vacancies/");
            then.status(200).json_body(serde_json::json!({"objects": []}));
        });

        let source = SuperJobSource::new(Client::new(), &server.url("/2.0/vacancies/"), 50, Some("  ".to_string()));
        let err = source.fetch("Engineer").await.unwrap_err();

        assert!(matches!(err, EtlError::MissingConfigError { .. }));
        api_mock.assert_hits(0);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_fetch_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/2.0/vacancies/");
            then.status(200).body("<html>maintenance</html>");
        });

        let source = SuperJobSource::new(
            Client::new(),
            &server.url("/2.0/vacancies/"),
            50,
            Some("key".to_string()),
        );
        assert!(matches!(
            source.fetch("Engineer").await,
            Err(EtlError::FetchError { .. })
        ));
    }
}

use crate::adapters::records_under;
use crate::domain::model::RawRecord;
use crate::domain::ports::VacancySource;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::Client;

pub const SOURCE_NAME: &str = "headhunter";
pub const DEFAULT_ENDPOINT: &str = "https://api.hh.ru/vacancies";

pub struct HeadHunterSource {
    client: Client,
    endpoint: String,
    per_page: usize,
    only_with_salary: bool,
}

impl HeadHunterSource {
    pub fn new(client: Client, endpoint: &str, per_page: usize, only_with_salary: bool) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            per_page,
            only_with_salary,
        }
    }
}

#[async_trait]
impl VacancySource for HeadHunterSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, query: &str) -> Result<Vec<RawRecord>> {
        tracing::debug!("Making HeadHunter request to: {} (text={})", self.endpoint, query);

        let per_page = self.per_page.to_string();
        let only_with_salary = self.only_with_salary.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            // hh.ru 會拒絕沒有 User-Agent 的請求
            .header(USER_AGENT, concat!("vacancy-etl/", env!("CARGO_PKG_VERSION")))
            .query(&[
                ("text", query),
                ("per_page", per_page.as_str()),
                ("only_with_salary", only_with_salary.as_str()),
            ])
            .send()
            .await
            .map_err(|e| EtlError::fetch(SOURCE_NAME, e.to_string()))?;

        tracing::debug!("HeadHunter response status: {}", response.status());
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

        Ok(records_under(body, "items", SOURCE_NAME))
    }
}

use crate::domain::model::{Criteria, Posting, RawRecord};
use crate::utils::error::Result;
use async_trait::async_trait;

/// An upstream job search API.
#[async_trait]
pub trait VacancySource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self, query: &str) -> Result<Vec<RawRecord>>;
}

/// Multiplier from a currency code to the base currency.
#[async_trait]
pub trait CurrencyConverter: Send + Sync {
    async fn rate(&self, code: &str) -> Result<f64>;
}

pub trait PostingStore: Send + Sync {
    fn add_posting(&self, posting: &Posting) -> Result<()>;
    fn query_postings(&self, criteria: &Criteria) -> Result<Vec<Posting>>;
    /// Rewrites the file without records equal to `posting`; returns how many were removed.
    fn remove_posting(&self, posting: &Posting) -> Result<usize>;
}

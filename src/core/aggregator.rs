use crate::core::normalizer::Normalizer;
use crate::domain::model::{Posting, RawRecord, SortKey};
use crate::domain::ports::VacancySource;
use crate::utils::error::EtlError;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Minimum number of fetch workers; both sources must be in flight together.
pub const MIN_WORKERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Each search starts from an empty list.
    #[default]
    Reset,
    /// Earlier results are kept and re-filtered against the latest query.
    Accumulate,
}

#[derive(Debug)]
pub struct SourceFailure {
    pub source: String,
    pub error: EtlError,
}

#[derive(Debug, Default)]
pub struct SearchReport {
    pub fetched: usize,
    pub accepted: usize,
    pub dropped: usize,
    pub unconverted: usize,
    /// Postings left in the session after filtering.
    pub retained: usize,
    pub failures: Vec<SourceFailure>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopSelection {
    pub postings: Vec<Posting>,
    pub requested: usize,
    pub available: usize,
}

impl TopSelection {
    /// How many postings were missing to satisfy the request.
    pub fn shortfall(&self) -> Option<usize> {
        (self.requested > self.available).then(|| self.requested - self.available)
    }
}

/// Session state for one run: the sources, the normalizer and the current
/// posting list. Only the owner mutates the list, after every fetch task
/// has joined.
pub struct SearchSession {
    sources: Vec<Arc<dyn VacancySource>>,
    normalizer: Normalizer,
    pool: Arc<Semaphore>,
    mode: SearchMode,
    query: Option<String>,
    postings: Vec<Posting>,
}

impl SearchSession {
    pub fn new(
        sources: Vec<Arc<dyn VacancySource>>,
        normalizer: Normalizer,
        workers: usize,
        mode: SearchMode,
    ) -> Self {
        Self {
            sources,
            normalizer,
            pool: Arc::new(Semaphore::new(workers.max(MIN_WORKERS))),
            mode,
            query: None,
            postings: Vec::new(),
        }
    }

    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    pub fn last_query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub async fn search(&mut self, query: &str) -> SearchReport {
        tracing::info!("🔎 Searching {} source(s) for '{}'", self.sources.len(), query);

        let (raw_records, failures) = self.fetch_all(query).await;
        let mut report = SearchReport {
            fetched: raw_records.len(),
            failures,
            ..SearchReport::default()
        };

        let mut batch = Vec::with_capacity(raw_records.len());
        for raw in &raw_records {
            match self.normalizer.normalize(raw).await {
                Ok(normalized) => {
                    if normalized.conversion_error.is_some() {
                        report.unconverted += 1;
                    }
                    batch.push(normalized.posting);
                }
                Err(e) => {
                    tracing::debug!("Dropping record from {}: {}", raw.source, e);
                    report.dropped += 1;
                }
            }
        }
        report.accepted = batch.len();

        if self.mode == SearchMode::Reset {
            self.postings.clear();
        }
        self.postings.extend(batch);
        self.query = Some(query.to_string());
        self.filter_by_query(query);
        report.retained = self.postings.len();

        tracing::info!(
            "✅ Search '{}' done: fetched {}, accepted {}, dropped {}, kept {}",
            query,
            report.fetched,
            report.accepted,
            report.dropped,
            report.retained
        );
        report
    }

    /// Spawns every source fetch before awaiting any of them. A failing
    /// source contributes no records and never affects the others.
    async fn fetch_all(&self, query: &str) -> (Vec<RawRecord>, Vec<SourceFailure>) {
        let handles: Vec<_> = self
            .sources
            .iter()
            .map(|source| {
                let source = Arc::clone(source);
                let pool = Arc::clone(&self.pool);
                let query = query.to_string();
                let name = source.name().to_string();
                let handle = tokio::spawn(async move {
                    let _permit = match pool.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => return Err(EtlError::fetch(source.name(), e.to_string())),
                    };
                    tracing::debug!("Fetching from {}", source.name());
                    source.fetch(&query).await
                });
                (name, handle)
            })
            .collect();

        let mut records = Vec::new();
        let mut failures = Vec::new();
        for (name, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(EtlError::fetch(&name, format!("fetch task aborted: {}", e))),
            };

            match result {
                Ok(batch) => {
                    tracing::debug!("{} returned {} record(s)", name, batch.len());
                    records.extend(batch);
                }
                Err(error) => {
                    tracing::warn!("⚠️ Source {} failed: {}", name, error);
                    failures.push(SourceFailure {
                        source: name,
                        error,
                    });
                }
            }
        }

        (records, failures)
    }

    /// Keeps postings whose title contains `query` (case-insensitive) and
    /// whose salary is set.
    pub fn filter_by_query(&mut self, query: &str) {
        self.postings
            .retain(|posting| posting.salary > 0 && posting.title_matches(query));
    }

    /// Sorts descending by `key` and keeps the first `n`. Ties keep their
    /// fetch order.
    pub fn select_top(&mut self, key: SortKey, n: usize) -> TopSelection {
        let available = self.postings.len();
        if n > available {
            tracing::info!(
                "ℹ️ Requested top {} but only {} vacancies were found",
                n,
                available
            );
        }

        self.postings.sort_by(|a, b| key.compare(a, b));
        self.postings.truncate(n);

        TopSelection {
            postings: self.postings.clone(),
            requested: n,
            available,
        }
    }

    pub fn select_top_by_salary(&mut self, n: usize) -> TopSelection {
        self.select_top(SortKey::Salary, n)
    }

    pub fn select_top_by_date(&mut self, n: usize) -> TopSelection {
        self.select_top(SortKey::Date, n)
    }
}

use crate::domain::model::{DraftPosting, Posting, RawRecord};
use crate::domain::ports::CurrencyConverter;
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::sync::Arc;

const DATE_FORMAT: &str = "%Y.%m.%d";

/// Decodes either upstream schema into a [`DraftPosting`].
///
/// Each field is taken from the first present (non-null) candidate:
/// `profession`/`name`, `link`/`alternate_url`, `payment_from`/`salary.from`,
/// `date_published`/`published_at`, `currency`/`salary.currency`.
pub fn decode(raw: &RawRecord) -> Result<DraftPosting> {
    let title = first_string(raw, &["profession", "name"])
        .ok_or_else(|| EtlError::unusable("record has neither 'profession' nor 'name'"))?;
    let link = first_string(raw, &["link", "alternate_url"])
        .ok_or_else(|| EtlError::unusable("record has neither 'link' nor 'alternate_url'"))?;

    let salary = raw
        .field("payment_from")
        .or_else(|| raw.nested("salary", "from"))
        .and_then(parse_amount);

    let date = match raw.field("date_published") {
        Some(value) => format_epoch(value),
        None => raw
            .field("published_at")
            .and_then(|value| value.as_str())
            .and_then(format_published_at),
    }
    .ok_or_else(|| EtlError::unusable(format!("record '{}' has no readable publication date", title)))?;

    let currency = raw
        .field("currency")
        .and_then(|value| value.as_str())
        .filter(|code| !code.is_empty())
        .or_else(|| raw.nested("salary", "currency").and_then(|value| value.as_str()))
        .map(|code| code.to_uppercase());

    Ok(DraftPosting {
        title,
        link,
        salary,
        currency,
        date,
    })
}

fn first_string(raw: &RawRecord, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| raw.field(key))
        .and_then(|value| value.as_str())
        .map(str::to_string)
}

fn parse_amount(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn format_epoch(value: &serde_json::Value) -> Option<String> {
    let seconds = value
        .as_i64()
        .or_else(|| value.as_f64().map(|secs| secs.trunc() as i64))?;
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.format(DATE_FORMAT).to_string())
}

/// 日期保留原本的時區，不轉成 UTC
fn format_published_at(value: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.format(DATE_FORMAT).to_string());
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.format(DATE_FORMAT).to_string());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, pattern) {
            return Some(dt.format(DATE_FORMAT).to_string());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.format(DATE_FORMAT).to_string())
}

/// A posting plus the conversion failure it was kept despite, if any.
#[derive(Debug)]
pub struct Normalized {
    pub posting: Posting,
    pub conversion_error: Option<EtlError>,
}

pub struct Normalizer {
    converter: Arc<dyn CurrencyConverter>,
    base_codes: Vec<String>,
}

impl Normalizer {
    pub fn new(converter: Arc<dyn CurrencyConverter>, base_codes: Vec<String>) -> Self {
        let base_codes = base_codes.into_iter().map(|code| code.to_uppercase()).collect();
        Self {
            converter,
            base_codes,
        }
    }

    pub fn is_base_currency(&self, code: &str) -> bool {
        self.base_codes.iter().any(|base| base == code)
    }

    pub async fn normalize(&self, raw: &RawRecord) -> Result<Normalized> {
        let draft = decode(raw)?;
        self.resolve(draft).await
    }

    /// Applies currency conversion and truncates the salary. Records without
    /// a positive salary come back as `UnusableRecord`.
    pub async fn resolve(&self, draft: DraftPosting) -> Result<Normalized> {
        let mut salary = match draft.salary {
            Some(amount) if amount != 0.0 => amount,
            _ => {
                return Err(EtlError::unusable(format!(
                    "'{}' has no salary",
                    draft.title
                )))
            }
        };

        let mut conversion_error = None;
        if let Some(code) = draft.currency.as_deref().filter(|code| !self.is_base_currency(code)) {
            match self.converter.rate(code).await {
                Ok(rate) => salary *= rate,
                Err(e) => {
                    tracing::warn!(
                        "⚠️ No rate for {}, keeping '{}' unconverted: {}",
                        code,
                        draft.title,
                        e
                    );
                    conversion_error = Some(match e {
                        EtlError::ConversionError { .. } => e,
                        other => EtlError::ConversionError {
                            currency: code.to_string(),
                            message: other.to_string(),
                        },
                    });
                }
            }
        }

        let salary = salary.trunc();
        if !salary.is_finite() || salary < 1.0 {
            return Err(EtlError::unusable(format!(
                "'{}' has a non-positive salary",
                draft.title
            )));
        }

        let posting = Posting::new(&draft.title, &draft.link, salary as u64, &draft.date)
            .map_err(|e| EtlError::unusable(e.to_string()))?;

        Ok(Normalized {
            posting,
            conversion_error,
        })
    }
}

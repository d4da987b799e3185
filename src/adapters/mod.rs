// Adapters layer: concrete implementations for external systems (job APIs, rates, files).

pub mod currency;
pub mod headhunter;
pub mod storage;
pub mod superjob;

use crate::domain::model::RawRecord;

/// Collects the JSON objects found under `key`; anything that is not an
/// object is skipped.
pub(crate) fn records_under(body: serde_json::Value, key: &str, source: &str) -> Vec<RawRecord> {
    let items = match body {
        serde_json::Value::Object(mut obj) => obj.remove(key),
        _ => None,
    };

    match items {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::Object(data) => Some(RawRecord::new(source, data)),
                _ => None,
            })
            .collect(),
        _ => {
            tracing::debug!("No '{}' array in {} response", key, source);
            Vec::new()
        }
    }
}

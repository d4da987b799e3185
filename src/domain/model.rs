use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_posting_date, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Field names shared by both file formats, in column order.
pub const POSTING_FIELDS: [&str; 4] = ["title", "link", "salary", "date"];

/// One upstream record before normalization. `source` only names the
/// adapter that produced it; decoding never branches on it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub source: String,
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl RawRecord {
    pub fn new(source: &str, data: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            source: source.to_string(),
            data,
        }
    }

    /// 欄位存在且不是 null 才算有值
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key).filter(|value| !value.is_null())
    }

    pub fn nested(&self, key: &str, inner: &str) -> Option<&serde_json::Value> {
        self.field(key)
            .and_then(|value| value.get(inner))
            .filter(|value| !value.is_null())
    }
}

/// Source-agnostic intermediate record: every field resolved except the
/// currency conversion of the salary.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftPosting {
    pub title: String,
    pub link: String,
    pub salary: Option<f64>,
    pub currency: Option<String>,
    pub date: String,
}

/// A normalized vacancy. Equality is full-record; ordering is always
/// explicit through [`SortKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub title: String,
    pub link: String,
    pub salary: u64,
    pub date: String,
}

impl Posting {
    pub fn new(title: &str, link: &str, salary: u64, date: &str) -> Result<Self> {
        let posting = Self {
            title: title.to_string(),
            link: link.to_string(),
            salary,
            date: date.to_string(),
        };
        posting.validate()?;
        Ok(posting)
    }

    /// The file-serialized form of one field, as compared by store queries.
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "title" => Some(self.title.clone()),
            "link" => Some(self.link.clone()),
            "salary" => Some(self.salary.to_string()),
            "date" => Some(self.date.clone()),
            _ => None,
        }
    }

    pub fn title_matches(&self, query: &str) -> bool {
        self.title.to_lowercase().contains(&query.to_lowercase())
    }
}

impl Validate for Posting {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("title", &self.title)?;
        validate_url("link", &self.link)?;
        if self.salary == 0 {
            return Err(EtlError::ValidationError {
                message: format!("salary of '{}' must be greater than zero", self.title),
            });
        }
        validate_posting_date("date", &self.date)
    }
}

impl fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Vacancy: {}", self.title)?;
        writeln!(f, "Link: {}", self.link)?;
        writeln!(f, "Salary: from {} RUB", self.salary)?;
        writeln!(f, "Date: {}", self.date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Salary,
    Date,
}

impl SortKey {
    /// Descending comparator: highest salary / newest date first.
    pub fn compare(self, a: &Posting, b: &Posting) -> Ordering {
        match self {
            SortKey::Salary => b.salary.cmp(&a.salary),
            // YYYY.MM.DD 固定寬度，字典序即時間序
            SortKey::Date => b.date.cmp(&a.date),
        }
    }
}

/// Field name → expected string value. Every entry must match.
pub type Criteria = BTreeMap<String, String>;

pub fn criteria_matches(posting: &Posting, criteria: &Criteria) -> bool {
    criteria
        .iter()
        .all(|(key, expected)| posting.field(key).as_deref() == Some(expected.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(salary: u64, date: &str) -> Posting {
        Posting::new("Rust Engineer", "https://example.com/1", salary, date).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_fields() {
        assert!(Posting::new("", "https://example.com", 100, "2023.11.14").is_err());
        assert!(Posting::new("Dev", "not a url", 100, "2023.11.14").is_err());
        assert!(Posting::new("Dev", "https://example.com", 0, "2023.11.14").is_err());
        assert!(Posting::new("Dev", "https://example.com", 100, "14.11.2023").is_err());
        assert!(Posting::new("Dev", "https://example.com", 100, "2023.11.14").is_ok());
    }

    #[test]
    fn test_equality_is_full_record() {
        let a = posting(1000, "2023.11.14");
        let mut b = a.clone();
        assert_eq!(a, b);
        b.link = "https://example.com/2".to_string();
        assert_ne!(a, b);
    }

    #[test]
    fn test_sort_keys_are_descending() {
        let low = posting(1000, "2023.11.14");
        let high = posting(5000, "2023.01.02");
        assert_eq!(SortKey::Salary.compare(&high, &low), Ordering::Less);
        assert_eq!(SortKey::Date.compare(&low, &high), Ordering::Less);
        assert_eq!(SortKey::Salary.compare(&low, &low), Ordering::Equal);
    }

    #[test]
    fn test_title_matches_ignores_case() {
        let p = posting(1000, "2023.11.14");
        assert!(p.title_matches("rust"));
        assert!(p.title_matches("ENGINEER"));
        assert!(!p.title_matches("python"));
    }

    #[test]
    fn test_criteria_compare_serialized_strings() {
        let p = posting(90000, "2023.11.14");
        let mut criteria = Criteria::new();
        criteria.insert("salary".to_string(), "90000".to_string());
        assert!(criteria_matches(&p, &criteria));

        criteria.insert("date".to_string(), "2023.11.15".to_string());
        assert!(!criteria_matches(&p, &criteria));

        let mut unknown = Criteria::new();
        unknown.insert("company".to_string(), "Acme".to_string());
        assert!(!criteria_matches(&p, &unknown));

        assert!(criteria_matches(&p, &Criteria::new()));
    }

    #[test]
    fn test_display_lists_every_field() {
        let rendered = posting(1000, "2023.11.14").to_string();
        assert!(rendered.contains("Vacancy: Rust Engineer"));
        assert!(rendered.contains("Link: https://example.com/1"));
        assert!(rendered.contains("Salary: from 1000 RUB"));
        assert!(rendered.contains("Date: 2023.11.14"));
    }

    #[test]
    fn test_raw_record_treats_null_as_absent() {
        let data = serde_json::json!({"payment_from": null, "salary": {"from": 10, "currency": null}});
        let raw = RawRecord::new("test", data.as_object().unwrap().clone());
        assert!(raw.field("payment_from").is_none());
        assert_eq!(raw.nested("salary", "from").and_then(|v| v.as_i64()), Some(10));
        assert!(raw.nested("salary", "currency").is_none());
    }
}

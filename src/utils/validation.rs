use crate::utils::error::{EtlError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(EtlError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_file_extension(
    field_name: &str,
    file: &str,
    allowed_extensions: &[&str],
) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    match std::path::Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(extension) if allowed_set.contains(extension) => Ok(()),
        Some(extension) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 日期必須是 `YYYY.MM.DD`，固定寬度才能直接用字串排序
pub fn validate_posting_date(field_name: &str, date: &str) -> Result<()> {
    if chrono::NaiveDate::parse_from_str(date, "%Y.%m.%d").is_err() || date.len() != 10 {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: date.to_string(),
            reason: "Date must use the YYYY.MM.DD format".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("sources.headhunter.endpoint", "https://example.com").is_ok());
        assert!(validate_url("sources.headhunter.endpoint", "http://example.com").is_ok());
        assert!(validate_url("sources.headhunter.endpoint", "").is_err());
        assert!(validate_url("sources.headhunter.endpoint", "invalid-url").is_err());
        assert!(validate_url("sources.headhunter.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("search.concurrent_requests", 2, 2).is_ok());
        assert!(validate_positive_number("search.concurrent_requests", 1, 2).is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("storage.csv_file", "vacancies.csv", &["csv"]).is_ok());
        assert!(
            validate_file_extension("storage.json_file", "vacancies.jsonl", &["json", "jsonl"])
                .is_ok()
        );
        assert!(validate_file_extension("storage.csv_file", "vacancies.txt", &["csv"]).is_err());
        assert!(validate_file_extension("storage.csv_file", "vacancies", &["csv"]).is_err());
    }

    #[test]
    fn test_validate_posting_date() {
        assert!(validate_posting_date("date", "2023.11.14").is_ok());
        assert!(validate_posting_date("date", "2023-11-14").is_err());
        assert!(validate_posting_date("date", "2023.1.4").is_err());
        assert!(validate_posting_date("date", "2023.13.01").is_err());
    }
}

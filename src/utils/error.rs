use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Fetch from {source_name} failed: {message}")]
    FetchError {
        source_name: String,
        message: String,
    },

    #[error("Unusable record: {reason}")]
    UnusableRecord { reason: String },

    #[error("Currency conversion failed for {currency}: {message}")]
    ConversionError { currency: String, message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn fetch(source_name: &str, message: impl Into<String>) -> Self {
        Self::FetchError {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    pub fn unusable(reason: impl Into<String>) -> Self {
        Self::UnusableRecord {
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) | EtlError::FetchError { .. } => ErrorCategory::Network,
            EtlError::UnusableRecord { .. }
            | EtlError::ConversionError { .. }
            | EtlError::SerializationError(_)
            | EtlError::ValidationError { .. } => ErrorCategory::Data,
            EtlError::CsvError(_) | EtlError::IoError(_) => ErrorCategory::Storage,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單筆記錄的問題不影響整批
            EtlError::UnusableRecord { .. } | EtlError::ConversionError { .. } => {
                ErrorSeverity::Low
            }
            EtlError::ApiError(_) | EtlError::FetchError { .. } => ErrorSeverity::Medium,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ValidationError { .. } => ErrorSeverity::High,
            EtlError::IoError(_)
            | EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::ApiError(_) | EtlError::FetchError { .. } => {
                format!("Could not reach a job search service: {}", self)
            }
            EtlError::CsvError(_) | EtlError::IoError(_) => {
                format!("Could not read or write the vacancy files: {}", self)
            }
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => {
                format!("The configuration is not usable: {}", self)
            }
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::ApiError(_) | EtlError::FetchError { .. } => {
                "Check the network connection and the source endpoints, then search again"
            }
            EtlError::UnusableRecord { .. } => "The record was skipped; no action needed",
            EtlError::ConversionError { .. } => {
                "Check the currency rate service or add a static rate under [currency.rates]"
            }
            EtlError::CsvError(_) | EtlError::SerializationError(_) => {
                "The vacancy file may be corrupted; move it aside and save again"
            }
            EtlError::IoError(_) => "Check that the output directory exists and is writable",
            EtlError::MissingConfigError { .. } => {
                "Set the missing value in the config file or the environment (e.g. API_SUPERJOB_KEY)"
            }
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => {
                "Fix the configuration file and run again"
            }
            EtlError::ValidationError { .. } => "Check the input values",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_level_errors_are_low_severity() {
        assert_eq!(EtlError::unusable("no salary").severity(), ErrorSeverity::Low);
        let err = EtlError::ConversionError {
            currency: "USD".to_string(),
            message: "rate missing".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.category(), ErrorCategory::Data);
    }

    #[test]
    fn test_fetch_error_names_source() {
        let err = EtlError::fetch("superjob", "status 500");
        assert_eq!(err.to_string(), "Fetch from superjob failed: status 500");
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }
}

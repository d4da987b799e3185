use crate::adapters::{currency, headhunter, superjob};
use crate::core::aggregator::SearchMode;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub sources: SourcesConfig,
    pub currency: CurrencyConfig,
    pub storage: StorageConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub headhunter: HeadHunterConfig,
    pub superjob: SuperJobConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadHunterConfig {
    pub endpoint: String,
    pub per_page: usize,
    pub only_with_salary: bool,
}

impl Default for HeadHunterConfig {
    fn default() -> Self {
        Self {
            endpoint: headhunter::DEFAULT_ENDPOINT.to_string(),
            per_page: 100,
            only_with_salary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuperJobConfig {
    pub endpoint: String,
    pub count: usize,
    pub api_key: Option<String>,
}

impl Default for SuperJobConfig {
    fn default() -> Self {
        Self {
            endpoint: superjob::DEFAULT_ENDPOINT.to_string(),
            count: 100,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    pub endpoint: String,
    pub base_codes: Vec<String>,
    pub rates: HashMap<String, f64>,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            endpoint: currency::DEFAULT_RATES_ENDPOINT.to_string(),
            base_codes: vec!["RUB".to_string(), "RUR".to_string()],
            rates: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub output_dir: String,
    pub csv_file: String,
    pub json_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: ".".to_string(),
            csv_file: "vacancies.csv".to_string(),
            json_file: "vacancies.jsonl".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub concurrent_requests: usize,
    pub accumulate: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            concurrent_requests: 2,
            accumulate: false,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_SUPERJOB_KEY})，找不到的保留原字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// SuperJob key: the config value when it is set and resolved, else the environment.
    pub fn superjob_api_key(&self) -> Option<String> {
        self.sources
            .superjob
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty() && !key.starts_with("${"))
            .or_else(|| std::env::var(superjob::API_KEY_ENV).ok())
    }

    pub fn search_mode(&self) -> SearchMode {
        if self.search.accumulate {
            SearchMode::Accumulate
        } else {
            SearchMode::Reset
        }
    }

    pub fn csv_path(&self) -> PathBuf {
        Path::new(&self.storage.output_dir).join(&self.storage.csv_file)
    }

    pub fn json_path(&self) -> PathBuf {
        Path::new(&self.storage.output_dir).join(&self.storage.json_file)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("sources.headhunter.endpoint", &self.sources.headhunter.endpoint)?;
        validation::validate_url("sources.superjob.endpoint", &self.sources.superjob.endpoint)?;
        validation::validate_url("currency.endpoint", &self.currency.endpoint)?;

        validation::validate_range("sources.headhunter.per_page", self.sources.headhunter.per_page, 1, 100)?;
        validation::validate_range("sources.superjob.count", self.sources.superjob.count, 1, 100)?;

        validation::validate_positive_number(
            "search.concurrent_requests",
            self.search.concurrent_requests,
            crate::core::aggregator::MIN_WORKERS,
        )?;

        if self.currency.base_codes.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "currency.base_codes".to_string(),
            });
        }
        for code in &self.currency.base_codes {
            validation::validate_non_empty_string("currency.base_codes", code)?;
        }
        for (code, rate) in &self.currency.rates {
            if !(rate.is_finite() && *rate > 0.0) {
                return Err(EtlError::InvalidConfigValueError {
                    field: format!("currency.rates.{}", code),
                    value: rate.to_string(),
                    reason: "Rate must be a positive number".to_string(),
                });
            }
        }

        validation::validate_path("storage.output_dir", &self.storage.output_dir)?;
        validation::validate_file_extension("storage.csv_file", &self.storage.csv_file, &["csv"])?;
        validation::validate_file_extension(
            "storage.json_file",
            &self.storage.json_file,
            &["json", "jsonl"],
        )?;

        Ok(())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_public_apis() {
        let config = TomlConfig::from_toml_str("").unwrap();

        assert_eq!(config.sources.headhunter.endpoint, "https://api.hh.ru/vacancies");
        assert_eq!(config.sources.headhunter.per_page, 100);
        assert!(config.sources.headhunter.only_with_salary);
        assert_eq!(config.sources.superjob.endpoint, "https://api.superjob.ru/2.0/vacancies/");
        assert_eq!(config.currency.base_codes, vec!["RUB", "RUR"]);
        assert_eq!(config.search_mode(), SearchMode::Reset);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[sources.headhunter]
endpoint = "https://hh.example.com/vacancies"
per_page = 20

[sources.superjob]
endpoint = "https://sj.example.com/2.0/vacancies/"
count = 30
api_key = "v3.r.abc"

[currency]
rates = { USD = 90.5, EUR = 98.0 }

[storage]
output_dir = "./out"
csv_file = "top.csv"
json_file = "top.json"

[search]
concurrent_requests = 4
accumulate = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.sources.headhunter.per_page, 20);
        assert_eq!(config.sources.superjob.count, 30);
        assert_eq!(config.superjob_api_key().as_deref(), Some("v3.r.abc"));
        assert_eq!(config.currency.rates.get("USD"), Some(&90.5));
        assert_eq!(config.csv_path(), Path::new("./out").join("top.csv"));
        assert_eq!(config.search.concurrent_requests, 4);
        assert_eq!(config.search_mode(), SearchMode::Accumulate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("VACANCY_ETL_TEST_HH_ENDPOINT", "https://test.hh.example.com");

        let toml_content = r#"
[sources.headhunter]
endpoint = "${VACANCY_ETL_TEST_HH_ENDPOINT}"

[sources.superjob]
api_key = "${VACANCY_ETL_TEST_UNSET_KEY}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.sources.headhunter.endpoint, "https://test.hh.example.com");
        // 未設定的變數原樣保留
        assert_eq!(
            config.sources.superjob.api_key.as_deref(),
            Some("${VACANCY_ETL_TEST_UNSET_KEY}")
        );

        std::env::remove_var("VACANCY_ETL_TEST_HH_ENDPOINT");
    }

    #[test]
    fn test_config_validation() {
        let invalid = [
            "[sources.headhunter]\nendpoint = \"invalid-url\"",
            "[sources.headhunter]\nper_page = 0",
            "[search]\nconcurrent_requests = 1",
            "[storage]\ncsv_file = \"vacancies.txt\"",
            "[currency]\nbase_codes = []",
            "[currency]\nrates = { USD = -1.0 }",
        ];

        for content in invalid {
            let config = TomlConfig::from_toml_str(content).unwrap();
            assert!(config.validate().is_err(), "expected invalid: {}", content);
        }
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[storage]\noutput_dir = \"./saved\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.storage.output_dir, "./saved");
        assert_eq!(config.json_path(), Path::new("./saved").join("vacancies.jsonl"));
    }
}

use crate::config::toml_config::TomlConfig;
use crate::utils::error::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "vacancy-etl")]
#[command(about = "Search HeadHunter and SuperJob vacancies, rank them and save them to CSV/JSON")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory for the saved vacancy files
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Number of fetch workers (at least 2)
    #[arg(long)]
    pub concurrent_requests: Option<usize>,

    /// Keep earlier results and re-filter them on every search
    #[arg(long)]
    pub accumulate: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CliConfig {
    /// Loads the TOML file (or defaults) and applies the command line overrides.
    pub fn load(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(output_dir) = &self.output_dir {
            config.storage.output_dir = output_dir.clone();
        }
        if let Some(workers) = self.concurrent_requests {
            config.search.concurrent_requests = workers;
        }
        if self.accumulate {
            config.search.accumulate = true;
        }

        Ok(config)
    }
}

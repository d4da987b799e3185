pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::TomlConfig;
pub use crate::core::{aggregator::SearchSession, interaction::JobSearchApp};
pub use domain::model::{Criteria, Posting, SortKey};
pub use utils::error::{EtlError, Result};

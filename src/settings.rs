use std::path::{Path, PathBuf};

use config::Config;
use serde::Deserialize;

use crate::error::Result;
use crate::rules::ExtractionRules;

const DEFAULT_FILE: &str = "harvest";
const ENV_PREFIX: &str = "HARVEST";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub db_path: PathBuf,
    /// Base URL of the collector; `/add_addresses` is appended.
    pub collector_url: String,
    pub bind: String,
    pub rules: ExtractionRules,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            db_path: PathBuf::from("data/addresses.sqlite"),
            collector_url: "http://localhost:8000".to_string(),
            bind: "127.0.0.1:8000".to_string(),
            rules: ExtractionRules::default(),
        }
    }
}

impl Settings {
    /// Defaults, then `harvest.toml` (or `file`), then `HARVEST_*` variables.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_FILE).required(false),
        };
        let settings = Config::builder()
            .add_source(source)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

//! Layered configuration for the CLI.
//!
//! Sources, lowest precedence first: built-in defaults, a TOML file
//! (`benchtrail.toml` in the working directory, or `--config`), then
//! `BENCHTRAIL_*` environment variables. Command line flags override all
//! of them at the call site.

use benchtrail_core::DEFAULT_SUITE;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::CliError;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "benchtrail";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "BENCHTRAIL";

/// Effective CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Suite that runs are appended to and reported from.
    pub suite: String,
    /// Cap on runs kept per suite.
    #[serde(default)]
    pub max_items: Option<usize>,
    /// Repository URL stored in new history files.
    #[serde(default)]
    pub repo_url: Option<String>,
    /// Log filter used when no environment filter is set.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            suite: DEFAULT_SUITE.to_string(),
            max_items: None,
            repo_url: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Load settings. An explicit `path` must exist; the default file is
    /// optional.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        Self::load_with_env(path, config::Environment::with_prefix(ENV_PREFIX))
    }

    /// [`Settings::load`] with an explicit environment source.
    ///
    /// Every `BENCHTRAIL_*` variable becomes a key, so `BENCHTRAIL_LOG` and
    /// `BENCHTRAIL_CONFIG` show up as `log` and `config` and are ignored.
    fn load_with_env(path: Option<&Path>, env: config::Environment) -> Result<Self, CliError> {
        let defaults = Settings::default();
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = config::Config::builder()
            .set_default("suite", defaults.suite)?
            .set_default("log_level", defaults.log_level)?
            .add_source(file)
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;

        if settings.max_items == Some(0) {
            return Err(CliError::InvalidSetting("max_items must be at least 1".into()));
        }
        if settings.suite.trim().is_empty() {
            return Err(CliError::InvalidSetting("suite must not be empty".into()));
        }
        Ok(settings)
    }
}

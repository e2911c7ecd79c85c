//! Runtime settings
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional `config/agent-smith.{toml,yaml,json}` file, then environment
//! variables prefixed with `AGENT_SMITH_` (nested keys use `__`, e.g.
//! `AGENT_SMITH_LOGGING__LEVEL=debug`).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "config/agent-smith";
const ENV_PREFIX: &str = "AGENT_SMITH";

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Process-wide settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub max_agents_per_project: usize,
    pub max_tools_per_project: usize,
    pub session_timeout_minutes: u64,
    /// Background expiry sweep period; 0 disables the sweeper
    pub sweep_interval_seconds: u64,
    pub output_base_dir: PathBuf,
    /// Model assigned to agents added without one
    pub default_model: String,
    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_agents_per_project: 10,
            max_tools_per_project: 20,
            session_timeout_minutes: 30,
            sweep_interval_seconds: 60,
            output_base_dir: PathBuf::from("./generated_agents"),
            default_model: "gemini-2.0-flash".to_string(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from the default file location and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load settings from an explicit file (extension optional) and the
    /// environment; the file does not have to exist
    pub fn load_from<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref().to_string_lossy().to_string();
        let defaults = Self::default();

        let settings = config::Config::builder()
            .set_default("max_agents_per_project", defaults.max_agents_per_project as u64)?
            .set_default("max_tools_per_project", defaults.max_tools_per_project as u64)?
            .set_default("session_timeout_minutes", defaults.session_timeout_minutes)?
            .set_default("sweep_interval_seconds", defaults.sweep_interval_seconds)?
            .set_default(
                "output_base_dir",
                defaults.output_base_dir.to_string_lossy().to_string(),
            )?
            .set_default("default_model", defaults.default_model)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.format", "pretty")?
            .add_source(config::File::with_name(&file).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the store and generator cannot operate with
    pub fn validate(&self) -> Result<()> {
        if self.max_agents_per_project == 0 {
            return Err(Error::configuration(
                "max_agents_per_project must be greater than zero",
            ));
        }
        if self.max_tools_per_project == 0 {
            return Err(Error::configuration(
                "max_tools_per_project must be greater than zero",
            ));
        }
        if self.session_timeout_minutes == 0 {
            return Err(Error::configuration(
                "session_timeout_minutes must be greater than zero",
            ));
        }
        if self.output_base_dir.as_os_str().is_empty() {
            return Err(Error::configuration("output_base_dir cannot be empty"));
        }
        if self.default_model.trim().is_empty() {
            return Err(Error::configuration("default_model cannot be empty"));
        }
        if self.logging.level.trim().is_empty() {
            return Err(Error::configuration("logging.level cannot be empty"));
        }
        Ok(())
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_minutes * 60)
    }

    /// Sweep period, or `None` when the sweeper is disabled
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_seconds > 0).then(|| Duration::from_secs(self.sweep_interval_seconds))
    }
}

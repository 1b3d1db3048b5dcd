// Run settings
// Loaded from ~/.config/idmatch/config.toml (or a path given on the command line)

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use idmatch_recon::{FailureAction, RunPolicy};

pub const DEFAULT_API_BASE: &str = "http://api.makindo.io";

/// Environment variable that replaces `registry.token`.
pub const TOKEN_ENV: &str = "IDMATCH_REGISTRY_TOKEN";

const MAX_SUBMIT_ATTEMPTS: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },
    #[error("cannot parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("invalid setting {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file holding the `{state}_indiv_raw` tables.
    pub path: PathBuf,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    pub api_base: String,
    pub token: String,
    pub page_size: u32,
    pub timeout_secs: u64,
    /// JSONL file every fetched person is appended to.
    pub archive: Option<PathBuf>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: String::new(),
            page_size: 100,
            timeout_secs: 30,
            archive: None,
        }
    }
}

impl RegistrySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for RegistrySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrySettings")
            .field("api_base", &self.api_base)
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("page_size", &self.page_size)
            .field("timeout_secs", &self.timeout_secs)
            .field("archive", &self.archive)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    pub on_lookup_failure: FailureAction,
    pub on_submit_failure: FailureAction,
    pub submit_attempts: u32,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            on_lookup_failure: FailureAction::Skip,
            on_submit_failure: FailureAction::Skip,
            submit_attempts: 1,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub registry: RegistrySettings,
    pub policy: PolicySettings,
}

impl Settings {
    /// Default config file location.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("idmatch")
            .join("config.toml")
    }

    /// Load, apply the environment, validate.
    ///
    /// `path` falls back to [`Settings::config_path`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = Self::read(path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and apply the environment without validating. Callers that only
    /// need part of the settings validate that part themselves.
    pub fn read(path: Option<&Path>) -> Result<Self, ConfigError> {
        let default_path;
        let path = match path {
            Some(p) => p,
            None => {
                default_path = Self::config_path();
                &default_path
            }
        };

        let mut settings = Self::from_file(path)?;
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Parse a file without env overrides or validation. `.json` files are
    /// JSON; everything else is TOML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let parsed = if is_json {
            serde_json::from_str(&contents).map_err(|e| e.to_string())
        } else {
            toml::from_str(&contents).map_err(|e| e.to_string())
        };

        let settings: Self = parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Apply environment overrides. `lookup` is `std::env::var` in
    /// production.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.trim().is_empty()) {
            log::debug!("registry token taken from {TOKEN_ENV}");
            self.registry.token = token;
        }
    }

    pub fn validate_database(&self) -> Result<(), ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(invalid("database.path", "must name the demographic database file"));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_database()?;
        if self.registry.api_base.trim().is_empty() {
            return Err(invalid("registry.api_base", "must not be empty"));
        }
        if self.registry.token.trim().is_empty() {
            return Err(invalid(
                "registry.token",
                format!("must not be empty (set it in the file or via {TOKEN_ENV})"),
            ));
        }
        if self.registry.page_size == 0 {
            return Err(invalid("registry.page_size", "must be at least 1"));
        }
        if self.registry.timeout_secs == 0 {
            return Err(invalid("registry.timeout_secs", "must be at least 1"));
        }
        if !(1..=MAX_SUBMIT_ATTEMPTS).contains(&self.policy.submit_attempts) {
            return Err(invalid(
                "policy.submit_attempts",
                format!("must be between 1 and {MAX_SUBMIT_ATTEMPTS}, got {}", self.policy.submit_attempts),
            ));
        }
        Ok(())
    }

    pub fn run_policy(&self) -> RunPolicy {
        RunPolicy {
            on_lookup_failure: self.policy.on_lookup_failure,
            on_submit_failure: self.policy.on_submit_failure,
            submit_attempts: self.policy.submit_attempts,
            max_persons: None,
        }
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, message: message.into() }
}

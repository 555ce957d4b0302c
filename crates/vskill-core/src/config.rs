use crate::error::{Result, SkillError};
use crate::ports::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_KEY_VAR: &str = "VIDEODB_API_KEY";
pub const BASE_URL_VAR: &str = "VIDEODB_BASE_URL";
pub const POLL_ATTEMPTS_VAR: &str = "VIDEODB_INDEX_POLL_ATTEMPTS";
pub const POLL_INTERVAL_VAR: &str = "VIDEODB_INDEX_POLL_INTERVAL_SECS";
pub const HTTP_TIMEOUT_VAR: &str = "VIDEODB_HTTP_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "https://api.videodb.io";

const ENV_FILE_NAME: &str = ".env";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from a `.env` file
    File,
    /// Loaded from the process environment
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for the skills
///
/// Resolved once at process start and handed to the backend and the poller;
/// nothing below the binary reads the environment on its own.
#[derive(Debug, Clone)]
pub struct SkillConfig {
    pub api_key: ConfigValue<Option<String>>,
    pub base_url: ConfigValue<String>,
    pub poll_attempts: ConfigValue<u32>,
    pub poll_interval_secs: ConfigValue<u64>,
    pub http_timeout_secs: ConfigValue<u64>,
}

impl SkillConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        let policy = RetryPolicy::default();
        Self {
            api_key: ConfigValue::new(None, ConfigSource::Default),
            base_url: ConfigValue::new(DEFAULT_BASE_URL.to_string(), ConfigSource::Default),
            poll_attempts: ConfigValue::new(policy.max_attempts, ConfigSource::Default),
            poll_interval_secs: ConfigValue::new(policy.interval.as_secs(), ConfigSource::Default),
            http_timeout_secs: ConfigValue::new(60, ConfigSource::Default),
        }
    }

    /// Load values bound by the candidate `.env` files
    pub fn load_from_env_files(mut self, candidates: &[PathBuf]) -> Result<Self> {
        let vars = resolve_env_files(candidates)?;
        self.apply(|key| vars.get(key).cloned(), ConfigSource::File);
        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        self.apply(|key| env::var(key).ok(), ConfigSource::Environment);
        self
    }

    /// Apply CLI-provided values
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(base_url) = overrides.base_url {
            self.base_url.update(base_url.trim_end_matches('/').to_string(), ConfigSource::Cli);
        }
    }

    fn apply(&mut self, lookup: impl Fn(&str) -> Option<String>, source: ConfigSource) {
        if let Some(api_key) = lookup(API_KEY_VAR).filter(|k| !k.trim().is_empty()) {
            self.api_key.update(Some(api_key), source);
        }

        if let Some(base_url) = lookup(BASE_URL_VAR).filter(|u| !u.trim().is_empty()) {
            self.base_url.update(base_url.trim_end_matches('/').to_string(), source);
        }

        if let Some(raw) = lookup(POLL_ATTEMPTS_VAR) {
            match raw.trim().parse::<u32>() {
                Ok(attempts) if attempts > 0 => self.poll_attempts.update(attempts, source),
                _ => tracing::warn!(
                    "Invalid {} value '{}': expected a positive integer",
                    POLL_ATTEMPTS_VAR,
                    raw
                ),
            }
        }

        if let Some(raw) = lookup(POLL_INTERVAL_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.poll_interval_secs.update(secs, source),
                Err(_) => tracing::warn!(
                    "Invalid {} value '{}': expected whole seconds",
                    POLL_INTERVAL_VAR,
                    raw
                ),
            }
        }

        if let Some(raw) = lookup(HTTP_TIMEOUT_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.http_timeout_secs.update(secs, source),
                _ => tracing::warn!(
                    "Invalid {} value '{}': expected positive whole seconds",
                    HTTP_TIMEOUT_VAR,
                    raw
                ),
            }
        }
    }

    /// The API key, or `ConfigMissing` when no layer provided one
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.value.as_deref().ok_or_else(|| SkillError::ConfigMissing {
            key: API_KEY_VAR.to_string(),
        })
    }

    /// Polling policy for index readiness
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.poll_attempts.value,
            Duration::from_secs(self.poll_interval_secs.value),
        )
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.value)
    }
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub base_url: Option<String>,
}

/// Merge the variables bound by `.env` files, given in precedence order
///
/// Missing files are skipped. A key bound by an earlier file is never
/// overridden by a later one.
pub fn resolve_env_files(candidates: &[PathBuf]) -> Result<BTreeMap<String, String>> {
    let mut merged = BTreeMap::new();

    for path in candidates {
        if !path.is_file() {
            continue;
        }

        let iter = dotenvy::from_path_iter(path).map_err(|e| SkillError::ConfigInvalid {
            key: path.display().to_string(),
            reason: format!("Failed to read env file: {}", e),
        })?;

        let mut bound = 0usize;
        for item in iter {
            let (key, value) = item.map_err(|e| SkillError::ConfigInvalid {
                key: path.display().to_string(),
                reason: format!("Failed to parse env file: {}", e),
            })?;
            if !merged.contains_key(&key) {
                merged.insert(key, value);
                bound += 1;
            }
        }

        tracing::debug!(path = %path.display(), bound, "Loaded env file");
    }

    Ok(merged)
}

/// Candidate `.env` locations in precedence order
///
/// Collection root, skill root, and binary directory are derived from the
/// executable's location; the working directory comes last.
pub fn default_env_candidates(exe: Option<&Path>, cwd: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(bin_dir) = exe.and_then(Path::parent) {
        let skill_dir = bin_dir.parent();
        let collection_dir = skill_dir.and_then(Path::parent);

        for dir in [collection_dir, skill_dir, Some(bin_dir)].into_iter().flatten() {
            candidates.push(dir.join(ENV_FILE_NAME));
        }
    }

    if let Some(cwd) = cwd {
        let path = cwd.join(ENV_FILE_NAME);
        if !candidates.contains(&path) {
            candidates.push(path);
        }
    }

    candidates
}

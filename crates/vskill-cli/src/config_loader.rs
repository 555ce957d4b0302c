//! Configuration loading for skill runs

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use vskill_core::config::{default_env_candidates, CliConfigOverrides, SkillConfig};

/// Resolve configuration from `.env` files, the environment, and CLI flags
pub fn load_config(env_file: Option<&Path>, base_url: Option<String>) -> Result<SkillConfig> {
    let candidates = env_candidates(env_file);

    let mut config = SkillConfig::with_defaults()
        .load_from_env_files(&candidates)
        .context("Failed to load configuration")?
        .load_from_env();

    config.update_from_cli(CliConfigOverrides { base_url });
    tracing::debug!(
        base_url = %config.base_url.value,
        source = ?config.base_url.source,
        "Resolved configuration"
    );
    Ok(config)
}

fn env_candidates(env_file: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = env_file {
        if !path.is_file() {
            tracing::warn!("Env file {} does not exist", path.display());
        }
        candidates.push(path.to_path_buf());
    }

    let exe = std::env::current_exe().ok();
    let cwd = std::env::current_dir().ok();
    for path in default_env_candidates(exe.as_deref(), cwd.as_deref()) {
        if !candidates.contains(&path) {
            candidates.push(path);
        }
    }

    candidates
}

//! Runner settings, read from TOML.

use anyhow::{Context, Result, ensure};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_MAX_STEPS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryConfig {
    /// Most nodes a single driver call may run without suspending.
    pub max_steps: usize,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// Parses a config from TOML text.
///
/// # Errors
/// Bad TOML, or a `max_steps` of zero.
pub fn parse_config(text: &str) -> Result<StoryConfig> {
    let config: StoryConfig = toml::from_str(text).context("parsing story config")?;
    ensure!(config.max_steps > 0, "max_steps must be at least 1");
    Ok(config)
}

/// Loads the runner config, or the defaults if the file is missing or bad.
pub fn load_config(toml_path: &Path) -> StoryConfig {
    match try_load_config(toml_path) {
        Ok(config) => {
            info!(
                "story config loaded from '{}' (max steps {})",
                toml_path.display(),
                config.max_steps
            );
            config
        },
        Err(e) => {
            warn!(
                "Could not load story config from '{}': {:#}. Using defaults.",
                toml_path.display(),
                e
            );
            StoryConfig::default()
        },
    }
}

fn try_load_config(toml_path: &Path) -> Result<StoryConfig> {
    let text = fs::read_to_string(toml_path)
        .with_context(|| format!("reading story config from '{}'", toml_path.display()))?;
    parse_config(&text).with_context(|| format!("in '{}'", toml_path.display()))
}

//! Compiler options and their TOML loader.

use anyhow::{Context, Result, bail};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Columns a tab advances to the next multiple of.
pub const DEFAULT_TAB_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Tab stop width used when comparing indentation.
    pub tab_size: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            tab_size: DEFAULT_TAB_SIZE,
        }
    }
}

/// Parses options from TOML text. Missing keys take their defaults.
///
/// # Errors
/// Returns an error if the text is not valid TOML for [`CompileOptions`] or the tab
/// size is zero.
pub fn parse_options(text: &str) -> Result<CompileOptions> {
    let options: CompileOptions = toml::from_str(text).context("parsing compile options")?;
    if options.tab_size == 0 {
        bail!("tab_size must be at least 1");
    }
    Ok(options)
}

/// Loads options from a TOML file, falling back to defaults on error.
///
/// # Logging
/// - `info!` on successful load
/// - `warn!` if the file cannot be read or parsed
pub fn load_options(toml_path: &Path) -> CompileOptions {
    match try_load_options(toml_path) {
        Ok(options) => {
            info!(
                "compile options loaded from '{}' (tab size {})",
                toml_path.display(),
                options.tab_size
            );
            options
        },
        Err(e) => {
            warn!(
                "Could not load compile options from '{}': {:#}. Using defaults.",
                toml_path.display(),
                e
            );
            CompileOptions::default()
        },
    }
}

fn try_load_options(toml_path: &Path) -> Result<CompileOptions> {
    let text = fs::read_to_string(toml_path)
        .with_context(|| format!("reading compile options from '{}'", toml_path.display()))?;
    parse_options(&text).with_context(|| format!("in '{}'", toml_path.display()))
}

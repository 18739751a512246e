use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct DocsetConfig {
    #[serde(default)]
    pub docset: DocsetSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct DocsetSection {
    /// Docset bundle root; relative values resolve against the working
    /// directory.
    pub root: Option<PathBuf>,
    /// Search-index database; defaults to docSet.dsidx inside the bundle.
    pub db_path: Option<PathBuf>,
    /// Preparatory script run before extraction (renders the HTML tree and
    /// the database shell). Skipped when unset. Executed directly, so the
    /// file needs an executable bit and a shebang line.
    pub helper_script: Option<PathBuf>,
}

/// Load and parse a DocsetConfig from a TOML file. Returns default if the
/// file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<DocsetConfig> {
    if !config_path.exists() {
        return Ok(DocsetConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: DocsetConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

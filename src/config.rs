use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::variant::{Frame, Size};

pub const CONFIG_ENV_VAR: &str = "YTTHUMB_CONFIG";
pub const DEFAULT_TIMEOUT_SECS: f64 = 3.0;

/// Defaults read from a TOML file. Every key is optional; command-line flags
/// take precedence over anything set here.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub size: Option<Size>,
    pub frame: Option<Frame>,
    pub webp: Option<bool>,
    pub fallback: Option<bool>,
    pub timeout: Option<f64>,
    pub dir: Option<PathBuf>,
    pub mkdir: Option<bool>,
    pub overwrite: Option<bool>,
}

pub fn read_config(path: &Path) -> Result<Option<FileConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    let cfg = toml::from_str(&content).with_context(|| format!("Parsing {}", path.display()))?;
    Ok(Some(cfg))
}

/// Loads the config named on the command line, else the one named by
/// `YTTHUMB_CONFIG`, else returns empty defaults. A named file must exist.
pub fn load_config(explicit: Option<&Path>) -> Result<FileConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match env::var_os(CONFIG_ENV_VAR) {
            Some(value) if !value.is_empty() => PathBuf::from(value),
            _ => return Ok(FileConfig::default()),
        },
    };
    read_config(&path)?.ok_or_else(|| anyhow!("Missing config file at {}", path.display()))
}

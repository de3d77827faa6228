use std::fs;
use std::path::Path;

use chrono::Utc;
use facestroop_core::ExperimentConfig;

use crate::error::{CliError, Result};

#[must_use]
pub fn now_utc_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

pub fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::MissingPath {
            path: path.to_path_buf(),
        })
    }
}

pub fn write_string(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Built-in defaults, or the TOML/JSON file at `path`. Not validated.
pub fn load_config(path: Option<&Path>) -> Result<ExperimentConfig> {
    match path {
        Some(path) => {
            ensure_exists(path)?;
            tracing::debug!(path = %path.display(), "loading config");
            Ok(ExperimentConfig::from_path(path)?)
        }
        None => Ok(ExperimentConfig::default()),
    }
}

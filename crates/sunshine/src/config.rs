//! Config store for `apps.json`.
//!
//! Loaded once per run and saved once per run; the previous file is
//! copied to an adjacent `.backup` before every overwrite.

use std::path::{Path, PathBuf};

use crate::SunshineError;
use crate::apps::AppsConfig;

/// Loads the apps config, or a default one when the file does not exist.
pub fn load(path: &Path) -> Result<AppsConfig, SunshineError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "apps config not found, starting empty");
        return Ok(AppsConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: AppsConfig = serde_json::from_str(&content)?;

    tracing::info!(apps = config.apps.len(), path = %path.display(), "loaded apps config");
    Ok(config)
}

/// Saves the apps config, backing up the previous file first.
///
/// Parent directories are created as needed.
pub fn save(path: &Path, config: &AppsConfig) -> Result<(), SunshineError> {
    if path.exists() {
        let backup = backup_path(path);
        std::fs::copy(path, &backup)?;
        tracing::debug!(backup = %backup.display(), "backed up previous apps config");
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;

    tracing::info!(apps = config.apps.len(), path = %path.display(), "saved apps config");
    Ok(())
}

/// Returns the adjacent backup path for a config file.
fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".backup");
    path.with_file_name(name)
}

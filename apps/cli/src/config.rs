//! Environment-based configuration.
//!
//! Settings come from the environment, optionally seeded from `.env`
//! files in the working directory and next to the executable. Legacy
//! lowercase variable names are accepted as aliases.

use std::path::PathBuf;

use anyhow::bail;

/// Required settings plus the optional restart executables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Steam `libraryfolders.vdf` path.
    pub library_vdf_path: PathBuf,
    /// Sunshine `apps.json` path.
    pub apps_json_path: PathBuf,
    /// Folder where grid artwork is stored.
    pub grids_folder: PathBuf,
    /// SteamGridDB API key.
    pub griddb_api_key: String,
    /// Steam executable, when restarts are wanted.
    pub steam_exe_path: Option<PathBuf>,
    /// Sunshine executable, when restarts are wanted.
    pub sunshine_exe_path: Option<PathBuf>,
}

/// Accepted names per setting: canonical first, aliases after.
const LIBRARY_VDF_VARS: &[&str] = &[
    "STEAM_LIBRARY_VDF_PATH",
    "steam_library_vdf_path",
    "library_vdf_path",
];
const APPS_JSON_VARS: &[&str] = &[
    "SUNSHINE_APPS_JSON_PATH",
    "sunshine_apps_json_path",
    "apps_json_path",
];
const GRIDS_FOLDER_VARS: &[&str] = &[
    "SUNSHINE_GRIDS_FOLDER",
    "sunshine_grids_folder",
    "grids_folder",
];
const API_KEY_VARS: &[&str] = &["STEAMGRIDDB_API_KEY", "steamgriddb_api_key"];
const STEAM_EXE_VARS: &[&str] = &["STEAM_EXE_PATH", "steam_exe_path"];
const SUNSHINE_EXE_VARS: &[&str] = &["SUNSHINE_EXE_PATH", "sunshine_exe_path"];

/// Loads `.env` files, letting file values win while debugging.
pub fn load_env_files() {
    let _ = dotenvy::dotenv_override();

    // Also look next to the executable, which survives odd working dirs.
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let env_path = dir.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path_override(&env_path);
            }
        }
    }
}

impl Config {
    /// Reads and validates configuration from the process environment.
    ///
    /// Fails fast when a required value is missing, the library VDF does
    /// not exist, or the Sunshine config directory is absent.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Inner constructor over an arbitrary variable lookup (testable).
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut missing: Vec<&str> = Vec::new();
        let mut require = |vars: &'static [&'static str]| match first_value(&get, vars) {
            Some(v) => v,
            None => {
                missing.push(vars[0]);
                String::new()
            }
        };

        let library_vdf = require(LIBRARY_VDF_VARS);
        let apps_json = require(APPS_JSON_VARS);
        let grids_folder = require(GRIDS_FOLDER_VARS);
        let api_key = require(API_KEY_VARS);

        if !missing.is_empty() {
            bail!(
                "missing required environment variables: {}",
                missing.join(", ")
            );
        }

        let config = Self {
            library_vdf_path: normalize_path(&library_vdf),
            apps_json_path: normalize_path(&apps_json),
            grids_folder: normalize_path(&grids_folder),
            griddb_api_key: api_key,
            steam_exe_path: first_value(&get, STEAM_EXE_VARS)
                .map(|v| normalize_path(&v)),
            sunshine_exe_path: first_value(&get, SUNSHINE_EXE_VARS)
                .map(|v| normalize_path(&v)),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !self.library_vdf_path.exists() {
            bail!(
                "Steam library VDF file not found: {}",
                self.library_vdf_path.display()
            );
        }

        if let Some(parent) = self.apps_json_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                bail!(
                    "Sunshine config directory not found: {} (is Sunshine installed?)",
                    parent.display()
                );
            }
        }

        Ok(())
    }
}

/// Returns the first non-empty value among the accepted variable names.
fn first_value(get: &impl Fn(&str) -> Option<String>, vars: &[&str]) -> Option<String> {
    vars.iter()
        .find_map(|name| get(name).filter(|v| !v.is_empty()))
}

/// Normalizes a path coming from an env file.
///
/// Unescapes doubled Windows backslashes and expands a leading `~`.
fn normalize_path(raw: &str) -> PathBuf {
    let mut path = raw.replace("\\\\", "\\");

    if path == "~" || path.starts_with("~/") || path.starts_with("~\\") {
        if let Some(home) = home_dir() {
            path = format!("{}{}", home.display(), &path[1..]);
        }
    }

    PathBuf::from(path)
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .map(PathBuf::from)
}

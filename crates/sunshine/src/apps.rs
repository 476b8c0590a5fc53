//! Sunshine launch-entry model.
//!
//! Entries are kept as raw JSON objects so that fields this tool does not
//! understand round-trip untouched; typed accessors cover the handful of
//! fields the sync logic reads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One configured launchable item in `apps.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppEntry(pub Map<String, Value>);

impl AppEntry {
    /// Returns the display name, or `""` when absent.
    pub fn name(&self) -> &str {
        self.str_field("name")
    }

    /// Returns the launch command, or `""` when absent.
    pub fn cmd(&self) -> &str {
        self.str_field("cmd")
    }

    /// Returns the artwork path, or `""` when absent.
    pub fn image_path(&self) -> &str {
        self.str_field("image-path")
    }

    fn str_field(&self, key: &str) -> &str {
        self.0.get(key).and_then(Value::as_str).unwrap_or("")
    }

    /// Builds a new Steam entry with the fixed field set Sunshine expects.
    ///
    /// `image_path` is the empty string when no artwork was found.
    pub fn new_steam_app(name: &str, cmd: &str, image_path: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("name".into(), Value::String(name.into()));
        fields.insert("cmd".into(), Value::String(cmd.into()));
        fields.insert("output".into(), Value::String(String::new()));
        fields.insert("detached".into(), Value::String(String::new()));
        fields.insert("elevated".into(), Value::String("false".into()));
        fields.insert("hidden".into(), Value::String("true".into()));
        fields.insert("wait-all".into(), Value::String("true".into()));
        fields.insert("exit-timeout".into(), Value::String("5".into()));
        fields.insert("image-path".into(), Value::String(image_path.into()));
        Self(fields)
    }
}

/// Top-level `apps.json` structure.
///
/// Unknown top-level fields are preserved across load/save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppsConfig {
    #[serde(default)]
    pub env: String,

    #[serde(default)]
    pub apps: Vec<AppEntry>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for AppsConfig {
    fn default() -> Self {
        Self {
            env: String::new(),
            apps: Vec::new(),
            extra: Map::new(),
        }
    }
}

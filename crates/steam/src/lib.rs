pub mod launch;
pub mod library;
pub mod store;
pub mod vdf;

// Re-export primary types.
pub use launch::{LaunchMode, extract_app_id};
pub use library::load_installed_app_ids;
pub use store::{NameCache, StoreClient, resolve_names};
pub use vdf::KeyValues;

/// Errors for Steam operations.
#[derive(Debug, thiserror::Error)]
pub enum SteamError {
    #[error("library VDF not found: {0}")]
    LibraryNotFound(String),

    #[error("VDF parse error: {0}")]
    Vdf(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("invalid store client configuration: {0}")]
    Config(String),
}

//! Sunshine `apps.json` handling: entry model, deduplication,
//! reconciliation against the installed library, and the config store.

pub mod apps;
pub mod config;
pub mod dedupe;
pub mod reconcile;

// Re-export primary types.
pub use apps::{AppEntry, AppsConfig};
pub use dedupe::{DedupeResult, dedupe_apps, score_for_keep};
pub use reconcile::{ReconcileResult, new_games, reconcile, remove_stale_artwork};

/// Errors for Sunshine config operations.
#[derive(Debug, thiserror::Error)]
pub enum SunshineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid apps config: {0}")]
    Json(#[from] serde_json::Error),
}

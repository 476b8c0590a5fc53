//! SteamGridDB API client for grid artwork.
//!
//! Provides an async client for the [SteamGridDB](https://www.steamgriddb.com)
//! API v2 plus the download-validate-persist pipeline that turns an app id
//! into a PNG on disk.

pub mod artwork;
pub mod client;
pub mod types;

pub use artwork::{FETCH_CONCURRENCY, fetch_grid, fetch_grids};
pub use client::Client;
pub use types::GridImage;

/// Errors from SteamGridDB operations.
#[derive(Debug, thiserror::Error)]
pub enum GridDbError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid image data: {0}")]
    Image(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid API key")]
    InvalidKey,
}

impl GridDbError {
    /// Returns true for errors worth retrying.
    ///
    /// Malformed JSON and invalid image bytes are permanent for a given
    /// app; only network-level failures get another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            GridDbError::Http(e) => e.is_timeout() || e.is_connect(),
            GridDbError::Api { .. } => true,
            _ => false,
        }
    }
}

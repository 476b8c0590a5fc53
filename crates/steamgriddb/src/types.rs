//! Wire types for the SteamGridDB API.

use serde::Deserialize;

/// Generic API response wrapper.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: T,
}

/// A single grid image entry.
#[derive(Debug, Clone, Deserialize)]
pub struct GridImage {
    #[serde(default)]
    pub id: i64,
    pub url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

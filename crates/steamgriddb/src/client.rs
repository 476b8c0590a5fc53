//! SteamGridDB API client.
//!
//! Async HTTP client using `reqwest` with Bearer token authentication.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use crate::GridDbError;
use crate::types::{ApiResponse, GridImage};

const DEFAULT_BASE_URL: &str = "https://www.steamgriddb.com/api/v2";

/// Per-call timeout for API requests.
const API_TIMEOUT: Duration = Duration::from_secs(15);

/// Per-call timeout for image downloads (responses carry image payloads).
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// SteamGridDB API client.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Creates a new client with the given API key.
    pub fn new(api_key: &str) -> Result<Self, GridDbError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|_| GridDbError::InvalidKey)?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Sets a custom base URL (for testing).
    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Returns grid images for a Steam app id, best match first.
    pub async fn steam_grids(&self, app_id: &str) -> Result<Vec<GridImage>, GridDbError> {
        let url = format!("{}/grids/steam/{app_id}", self.base_url);
        let resp = self.http.get(&url).timeout(API_TIMEOUT).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GridDbError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.bytes().await?;
        let parsed: ApiResponse<Vec<GridImage>> = serde_json::from_slice(&body)?;
        Ok(parsed.data)
    }

    /// Downloads raw image data from a URL.
    pub async fn download_image(&self, url: &str) -> Result<Vec<u8>, GridDbError> {
        let resp = self.http.get(url).timeout(DOWNLOAD_TIMEOUT).send().await?;
        let status = resp.status();

        if !status.is_success() {
            return Err(GridDbError::Api {
                status: status.as_u16(),
                body: "download failed".into(),
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }
}

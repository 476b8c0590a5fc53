//! Grid artwork pipeline: fetch, validate, persist as PNG.
//!
//! A failed fetch yields "no artwork" for that app, never a batch
//! failure: entries added without artwork simply carry an empty
//! image path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::GridDbError;
use crate::client::Client;

/// Concurrent fetches during batch download.
///
/// Lower than name-lookup concurrency because responses carry image
/// payloads.
pub const FETCH_CONCURRENCY: usize = 5;

/// Attempts per app before it resolves to "no artwork".
const FETCH_ATTEMPTS: u32 = 3;

/// Batch progress is logged every this many completed fetches.
const PROGRESS_INTERVAL: usize = 10;

/// Fetches the best grid for an app id and saves it as
/// `<grids_dir>/<app_id>.png`.
///
/// Transient network failures are retried with exponential backoff;
/// missing grid data, malformed responses and invalid image bytes
/// resolve to `None` immediately.
pub async fn fetch_grid(client: &Client, app_id: &str, grids_dir: &Path) -> Option<PathBuf> {
    for attempt in 1..=FETCH_ATTEMPTS {
        match try_fetch_grid(client, app_id, grids_dir).await {
            Ok(path) => return path,
            Err(e) if e.is_transient() && attempt < FETCH_ATTEMPTS => {
                tracing::warn!(app_id, attempt, error = %e, "grid fetch failed, retrying");
                tokio::time::sleep(backoff(attempt)).await;
            }
            Err(e) => {
                tracing::warn!(app_id, error = %e, "grid fetch failed");
                return None;
            }
        }
    }

    tracing::warn!(app_id, attempts = FETCH_ATTEMPTS, "grid fetch exhausted retries");
    None
}

async fn try_fetch_grid(
    client: &Client,
    app_id: &str,
    grids_dir: &Path,
) -> Result<Option<PathBuf>, GridDbError> {
    let grids = client.steam_grids(app_id).await?;

    let Some(best) = grids.first() else {
        tracing::debug!(app_id, "no grid artwork available");
        return Ok(None);
    };

    let bytes = client.download_image(&best.url).await?;

    // Decode to verify the payload is a real image, then re-encode as PNG.
    let img = image::load_from_memory(&bytes).map_err(|e| GridDbError::Image(e.to_string()))?;

    std::fs::create_dir_all(grids_dir)?;
    let path = grids_dir.join(format!("{app_id}.png"));
    img.save_with_format(&path, image::ImageFormat::Png)
        .map_err(|e| GridDbError::Image(e.to_string()))?;

    tracing::debug!(app_id, path = %path.display(), "saved grid artwork");
    Ok(Some(path))
}

/// Fetches grids for a batch of app ids with bounded parallelism.
///
/// The result maps every input id to its saved artwork path, or `None`
/// when no artwork could be obtained.
pub async fn fetch_grids(
    client: &Client,
    app_ids: &[String],
    grids_dir: &Path,
) -> HashMap<String, Option<PathBuf>> {
    let total = app_ids.len();
    if total == 0 {
        return HashMap::new();
    }

    let semaphore = Arc::new(Semaphore::new(FETCH_CONCURRENCY));
    let mut tasks: JoinSet<(String, Option<PathBuf>)> = JoinSet::new();

    for app_id in app_ids.iter().cloned() {
        let client = client.clone();
        let semaphore = Arc::clone(&semaphore);
        let grids_dir = grids_dir.to_path_buf();

        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return (app_id, None);
            };
            let path = fetch_grid(&client, &app_id, &grids_dir).await;
            (app_id, path)
        });
    }

    let mut results = HashMap::new();
    let mut processed = 0usize;

    while let Some(result) = tasks.join_next().await {
        processed += 1;
        match result {
            Ok((app_id, path)) => {
                results.insert(app_id, path);
            }
            Err(e) => {
                tracing::warn!(error = %e, "grid fetch task failed");
            }
        }

        if processed % PROGRESS_INTERVAL == 0 || processed == total {
            tracing::info!(processed, total, "processed grid fetches");
        }
    }

    results
}

/// Exponential backoff: 1s after the first attempt, doubling after.
fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1 << (attempt - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Encodes a tiny valid PNG for download tests.
    fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([200, 40, 40, 255]));
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    /// Mock SteamGridDB server: `/grids/steam/<id>` returns a grid list
    /// pointing back at this server, any other path serves `image_bytes`.
    async fn mock_griddb(image_bytes: Vec<u8>) -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");
        let self_url = url.clone();

        let handle = tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = vec![0u8; 8192];
                let n = stream.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let path = request
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("/")
                    .to_string();

                let (content_type, body) = if path.contains("/grids/steam/") {
                    let json = format!(
                        r#"{{"success":true,"data":[{{"id":1,"url":"{self_url}/image.png"}}]}}"#
                    );
                    ("application/json".to_string(), json.into_bytes())
                } else {
                    ("image/png".to_string(), image_bytes.clone())
                };

                let header = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(header.as_bytes()).await;
                let _ = stream.write_all(&body).await;
                let _ = stream.shutdown().await;
            }
        });

        (url, handle)
    }

    #[tokio::test]
    async fn fetch_grid_saves_png() {
        let (url, handle) = mock_griddb(tiny_png()).await;
        let client = Client::new("test-key").unwrap().with_base_url(url);
        let tmp = tempfile::tempdir().unwrap();
        let grids_dir = tmp.path().join("grids");

        let path = fetch_grid(&client, "220", &grids_dir).await.unwrap();

        assert_eq!(path, grids_dir.join("220.png"));
        assert!(path.exists());
        // Saved file must decode as a real PNG.
        let saved = std::fs::read(&path).unwrap();
        assert!(image::load_from_memory(&saved).is_ok());

        handle.abort();
    }

    #[tokio::test]
    async fn fetch_grid_invalid_image_is_absent_without_retry() {
        let (url, handle) = mock_griddb(b"definitely not an image".to_vec()).await;
        let client = Client::new("test-key").unwrap().with_base_url(url);
        let tmp = tempfile::tempdir().unwrap();

        let start = std::time::Instant::now();
        let path = fetch_grid(&client, "220", tmp.path()).await;

        assert!(path.is_none());
        // Invalid bytes must not go through the backoff path.
        assert!(start.elapsed() < Duration::from_millis(900));
        assert!(!tmp.path().join("220.png").exists());

        handle.abort();
    }

    #[tokio::test]
    async fn fetch_grid_no_data_is_absent() {
        let (url, handle) = crate::client::tests::mock_server(
            200,
            "application/json",
            br#"{"success":true,"data":[]}"#.to_vec(),
        )
        .await;
        let client = Client::new("test-key").unwrap().with_base_url(url);
        let tmp = tempfile::tempdir().unwrap();

        assert!(fetch_grid(&client, "220", tmp.path()).await.is_none());

        handle.abort();
    }

    #[tokio::test]
    async fn fetch_grids_batch() {
        let (url, handle) = mock_griddb(tiny_png()).await;
        let client = Client::new("test-key").unwrap().with_base_url(url);
        let tmp = tempfile::tempdir().unwrap();

        let ids: Vec<String> = vec!["10".into(), "20".into()];
        let results = fetch_grids(&client, &ids, tmp.path()).await;

        assert_eq!(results.len(), 2);
        assert_eq!(
            results.get("10").unwrap().as_deref(),
            Some(tmp.path().join("10.png").as_path())
        );
        assert!(tmp.path().join("20.png").exists());

        handle.abort();
    }

    #[tokio::test]
    async fn fetch_grids_empty_input() {
        let client = Client::new("test-key").unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let results = fetch_grids(&client, &[], tmp.path()).await;
        assert!(results.is_empty());
    }

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff(1), Duration::from_secs(1));
        assert_eq!(backoff(2), Duration::from_secs(2));
    }
}

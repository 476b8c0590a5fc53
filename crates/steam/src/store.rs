//! Steam store `appdetails` client for resolving game names.
//!
//! Lookups are independently retryable and run as a bounded
//! fire-and-collect batch: a failed lookup only drops that one app from
//! the result map, it never aborts the batch.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

use crate::SteamError;

const DEFAULT_BASE_URL: &str = "https://store.steampowered.com/api";

/// Per-call timeout for a store lookup.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Attempts per lookup before the app resolves to absent.
const LOOKUP_ATTEMPTS: u32 = 3;

/// Concurrent lookups during batch resolution.
pub const LOOKUP_CONCURRENCY: usize = 10;

/// Batch progress is logged every this many completed lookups.
const PROGRESS_INTERVAL: usize = 50;

/// Default capacity for the name cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Steam store API client.
#[derive(Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
}

impl StoreClient {
    /// Creates a new client with the default per-call timeout.
    pub fn new() -> Result<Self, SteamError> {
        let http = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .map_err(|e| SteamError::Config(e.to_string()))?;

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

    /// Resolves the display name for an app id.
    ///
    /// Transient network errors (timeout, connection, HTTP status) are
    /// retried up to three attempts with exponential backoff. Malformed
    /// responses and apps the store does not know resolve to `None`
    /// immediately.
    pub async fn app_name(&self, app_id: &str) -> Option<String> {
        for attempt in 1..=LOOKUP_ATTEMPTS {
            match self.try_app_name(app_id).await {
                Ok(name) => return name,
                Err(e) if is_transient(&e) && attempt < LOOKUP_ATTEMPTS => {
                    tracing::warn!(
                        app_id,
                        attempt,
                        error = %e,
                        "store lookup failed, retrying"
                    );
                    tokio::time::sleep(backoff(attempt)).await;
                }
                Err(e) => {
                    tracing::warn!(app_id, error = %e, "store lookup failed");
                    return None;
                }
            }
        }

        tracing::warn!(app_id, attempts = LOOKUP_ATTEMPTS, "store lookup exhausted retries");
        None
    }

    async fn try_app_name(&self, app_id: &str) -> Result<Option<String>, reqwest::Error> {
        let url = format!("{}/appdetails", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("appids", app_id)])
            .send()
            .await?
            .error_for_status()?;

        let body: serde_json::Value = resp.json().await?;
        Ok(parse_app_name(&body, app_id))
    }
}

/// Extracts the game name from an `appdetails` response body.
fn parse_app_name(body: &serde_json::Value, app_id: &str) -> Option<String> {
    let entry = body.get(app_id)?;

    if !entry
        .get("success")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
    {
        tracing::debug!(app_id, "store has no data for app");
        return None;
    }

    entry
        .get("data")?
        .get("name")?
        .as_str()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Resolves names for a batch of app ids with bounded parallelism.
///
/// Results are keyed by app id; apps whose name could not be resolved
/// are simply absent from the returned map.
pub async fn resolve_names(
    client: &StoreClient,
    app_ids: &[String],
    cache: Arc<Mutex<NameCache>>,
) -> HashMap<String, String> {
    let total = app_ids.len();
    if total == 0 {
        return HashMap::new();
    }

    tracing::info!(total, "resolving game names");

    let semaphore = Arc::new(Semaphore::new(LOOKUP_CONCURRENCY));
    let mut tasks: JoinSet<(String, Option<String>)> = JoinSet::new();

    for app_id in app_ids.iter().cloned() {
        let client = client.clone();
        let semaphore = Arc::clone(&semaphore);
        let cache = Arc::clone(&cache);

        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return (app_id, None);
            };

            if let Some(name) = cache.lock().await.get(&app_id) {
                return (app_id, Some(name));
            }

            let name = client.app_name(&app_id).await;
            if let Some(name) = &name {
                cache.lock().await.insert(app_id.clone(), name.clone());
            }
            (app_id, name)
        });
    }

    let mut names = HashMap::new();
    let mut processed = 0usize;

    while let Some(result) = tasks.join_next().await {
        processed += 1;
        match result {
            Ok((app_id, Some(name))) => {
                tracing::debug!(app_id, name = %name, "resolved game name");
                names.insert(app_id, name);
            }
            Ok((app_id, None)) => {
                tracing::debug!(app_id, "app name unresolved, skipping");
            }
            Err(e) => {
                tracing::warn!(error = %e, "name lookup task failed");
            }
        }

        if processed % PROGRESS_INTERVAL == 0 || processed == total {
            tracing::info!(processed, total, "processed store lookups");
        }
    }

    tracing::info!(resolved = names.len(), total, "name resolution complete");
    names
}

/// Bounded name cache with FIFO eviction.
///
/// Injected into [`resolve_names`] so lookups survive across runs of the
/// batch without any process-wide state.
pub struct NameCache {
    capacity: usize,
    entries: HashMap<String, String>,
    order: VecDeque<String>,
}

impl NameCache {
    /// Creates a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Returns the cached name for an app id.
    pub fn get(&self, app_id: &str) -> Option<String> {
        self.entries.get(app_id).cloned()
    }

    /// Inserts a name, evicting the oldest entry when full.
    pub fn insert(&mut self, app_id: String, name: String) {
        if self.entries.contains_key(&app_id) {
            self.entries.insert(app_id, name);
            return;
        }

        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }

        self.order.push_back(app_id.clone());
        self.entries.insert(app_id, name);
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NameCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

/// Returns true for errors worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_status()
}

/// Exponential backoff: 1s after the first attempt, doubling after.
fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1 << (attempt - 1))
}

//! Launch-entry deduplication.
//!
//! Steam entries collapse to one per app id, opaque entries to one per
//! (name, cmd) pair. The keep policy is first-seen wins unless a later
//! duplicate scores strictly higher; this is deliberate, not an ordering
//! artifact.

use std::collections::{HashMap, HashSet};

use sunsync_steam::extract_app_id;

use crate::apps::AppEntry;

/// Outcome of a dedupe pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupeResult {
    /// Surviving entries, in first-kept-position order.
    pub kept: Vec<AppEntry>,
    /// Removed duplicates, in encounter order.
    pub removed: Vec<AppEntry>,
}

/// Scores how much an entry is worth keeping when duplicates collide.
///
/// Artwork outweighs a display name; the two signals are additive.
/// Absolute values only matter in comparison.
pub fn score_for_keep(app: &AppEntry) -> i32 {
    let mut score = 0;
    if !app.image_path().is_empty() {
        score += 10;
    }
    if !app.name().is_empty() {
        score += 3;
    }
    score
}

/// Collapses duplicate entries in a single ordered pass.
///
/// A later Steam duplicate replaces the kept entry in place only when it
/// scores strictly higher; ties favor the earlier entry. Opaque
/// duplicates are removed unconditionally.
pub fn dedupe_apps(apps: Vec<AppEntry>) -> DedupeResult {
    let mut kept: Vec<AppEntry> = Vec::new();
    let mut removed: Vec<AppEntry> = Vec::new();

    let mut steam_index: HashMap<String, usize> = HashMap::new();
    let mut other_seen: HashSet<(String, String)> = HashSet::new();

    for app in apps {
        let cmd = app.cmd().trim().to_string();
        let name = app.name().trim().to_string();

        if let Some(app_id) = extract_app_id(&cmd) {
            match steam_index.get(&app_id) {
                None => {
                    steam_index.insert(app_id, kept.len());
                    kept.push(app);
                }
                Some(&i) => {
                    if score_for_keep(&app) > score_for_keep(&kept[i]) {
                        let previous = std::mem::replace(&mut kept[i], app);
                        removed.push(previous);
                    } else {
                        removed.push(app);
                    }
                }
            }
        } else {
            let key = (name, cmd);
            if other_seen.insert(key) {
                kept.push(app);
            } else {
                removed.push(app);
            }
        }
    }

    DedupeResult { kept, removed }
}

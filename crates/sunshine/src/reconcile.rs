//! Reconciliation of existing entries against the installed library.
//!
//! Runs after dedupe: opaque entries always survive, Steam entries
//! survive only when their app is still installed. Dropped entries have
//! their artwork path scheduled for deletion; the caller decides when
//! (so a dry run touches nothing).

use std::collections::{HashMap, HashSet};
use std::path::Path;

use sunsync_steam::extract_app_id;

use crate::apps::AppEntry;

/// Outcome of a reconcile pass.
#[derive(Debug)]
pub struct ReconcileResult {
    /// Entries that survive, in input order.
    pub kept: Vec<AppEntry>,
    /// Dropped Steam entries as (display name, app id).
    pub removed_games: Vec<(String, String)>,
    /// App ids of installed games that already have an entry.
    pub matched: HashSet<String>,
    /// Artwork paths of dropped entries, pending deletion.
    pub stale_artwork: Vec<String>,
}

/// Splits existing entries into kept and removed against the installed set.
pub fn reconcile(apps: Vec<AppEntry>, installed: &HashMap<String, String>) -> ReconcileResult {
    let mut kept: Vec<AppEntry> = Vec::new();
    let mut removed_games: Vec<(String, String)> = Vec::new();
    let mut matched: HashSet<String> = HashSet::new();
    let mut stale_artwork: Vec<String> = Vec::new();

    for app in apps {
        let Some(app_id) = extract_app_id(app.cmd()) else {
            // Opaque entry: unaffected by installed-game state.
            kept.push(app);
            continue;
        };

        if installed.contains_key(&app_id) {
            matched.insert(app_id);
            kept.push(app);
        } else {
            if !app.image_path().is_empty() {
                stale_artwork.push(app.image_path().to_string());
            }
            removed_games.push((app.name().to_string(), app_id));
        }
    }

    ReconcileResult {
        kept,
        removed_games,
        matched,
        stale_artwork,
    }
}

/// Returns installed app ids with no surviving entry, in sorted order.
///
/// This set difference must run after [`reconcile`]: removals are decided
/// independently of what gets added.
pub fn new_games(installed: &HashMap<String, String>, matched: &HashSet<String>) -> Vec<String> {
    let mut ids: Vec<String> = installed
        .keys()
        .filter(|id| !matched.contains(*id))
        .cloned()
        .collect();
    ids.sort();
    ids
}

/// Deletes scheduled artwork files, best effort.
///
/// A failed or impossible deletion is logged and never escalates.
pub fn remove_stale_artwork(paths: &[String]) {
    for image_path in paths {
        if !Path::new(image_path).exists() {
            continue;
        }

        match std::fs::remove_file(image_path) {
            Ok(()) => tracing::debug!(path = %image_path, "removed grid artwork"),
            Err(e) => {
                tracing::warn!(path = %image_path, error = %e, "failed to remove grid artwork")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value};

    fn entry(fields: &[(&str, &str)]) -> AppEntry {
        let mut map = Map::new();
        for (k, v) in fields {
            map.insert((*k).into(), Value::String((*v).into()));
        }
        AppEntry(map)
    }

    fn steam_entry(app_id: &str, name: &str) -> AppEntry {
        entry(&[("name", name), ("cmd", &format!("steam://rungameid/{app_id}"))])
    }

    fn installed(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(id, name)| ((*id).to_string(), (*name).to_string()))
            .collect()
    }

    #[test]
    fn keeps_matched_and_reports_add_set() {
        let games = installed(&[("100", "Game100"), ("200", "Game200")]);
        let apps = vec![steam_entry("100", "Game100")];

        let result = reconcile(apps, &games);

        assert_eq!(result.kept.len(), 1);
        assert!(result.removed_games.is_empty());
        assert!(result.matched.contains("100"));
        assert_eq!(new_games(&games, &result.matched), vec!["200"]);
    }

    #[test]
    fn drops_uninstalled_games() {
        let games = installed(&[("100", "Game100")]);
        let apps = vec![steam_entry("100", "Game100"), steam_entry("300", "Gone")];

        let result = reconcile(apps, &games);

        assert_eq!(result.kept.len(), 1);
        assert_eq!(
            result.removed_games,
            vec![("Gone".to_string(), "300".to_string())]
        );
    }

    #[test]
    fn opaque_entries_always_kept() {
        let games = installed(&[]);
        let apps = vec![
            entry(&[("name", "Desktop"), ("cmd", "")]),
            entry(&[("name", "Browser"), ("cmd", "/usr/bin/firefox")]),
        ];

        let result = reconcile(apps.clone(), &games);
        assert_eq!(result.kept, apps);
        assert!(result.removed_games.is_empty());
        assert!(result.matched.is_empty());
    }

    #[test]
    fn schedules_artwork_of_dropped_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let art = tmp.path().join("300.png");
        std::fs::write(&art, "png-bytes").unwrap();

        let apps = vec![entry(&[
            ("name", "Gone"),
            ("cmd", "steam://rungameid/300"),
            ("image-path", art.to_str().unwrap()),
        ])];

        let result = reconcile(apps, &installed(&[]));

        assert_eq!(result.removed_games.len(), 1);
        assert_eq!(result.stale_artwork, vec![art.to_str().unwrap().to_string()]);
        // Reconcile itself only schedules; the file is still there.
        assert!(art.exists());

        remove_stale_artwork(&result.stale_artwork);
        assert!(!art.exists());
    }

    #[test]
    fn dropped_entry_without_artwork_schedules_nothing() {
        let apps = vec![steam_entry("300", "Gone")];

        let result = reconcile(apps, &installed(&[]));
        assert_eq!(
            result.removed_games,
            vec![("Gone".to_string(), "300".to_string())]
        );
        assert!(result.stale_artwork.is_empty());
    }

    #[test]
    fn missing_artwork_file_is_skipped() {
        // Deleting a path that no longer exists must not panic or warn-fail.
        remove_stale_artwork(&["/nonexistent/300.png".to_string()]);
    }

    #[test]
    fn kept_artwork_not_scheduled() {
        let tmp = tempfile::tempdir().unwrap();
        let art = tmp.path().join("100.png");
        std::fs::write(&art, "png-bytes").unwrap();

        let apps = vec![entry(&[
            ("name", "Here"),
            ("cmd", "steam://rungameid/100"),
            ("image-path", art.to_str().unwrap()),
        ])];

        let result = reconcile(apps, &installed(&[("100", "Here")]));
        assert_eq!(result.kept.len(), 1);
        assert!(result.stale_artwork.is_empty());
        assert!(art.exists());
    }

    #[test]
    fn reconcile_is_idempotent() {
        let games = installed(&[("100", "A"), ("200", "B")]);
        let apps = vec![
            steam_entry("100", "A"),
            steam_entry("999", "Stale"),
            entry(&[("name", "Desktop"), ("cmd", "")]),
        ];

        let first = reconcile(apps, &games);
        let second = reconcile(first.kept.clone(), &games);

        assert_eq!(second.kept, first.kept);
        assert!(second.removed_games.is_empty());
        assert_eq!(second.matched, first.matched);
    }

    #[test]
    fn new_games_set_difference() {
        let games = installed(&[("A", "a"), ("B", "b"), ("C", "c")]);
        let matched: HashSet<String> = ["A", "B"].iter().map(|s| s.to_string()).collect();

        assert_eq!(new_games(&games, &matched), vec!["C"]);
    }

    #[test]
    fn new_games_all_matched() {
        let games = installed(&[("A", "a")]);
        let matched: HashSet<String> = ["A".to_string()].into_iter().collect();
        assert!(new_games(&games, &matched).is_empty());
    }
}

//! Installed-app scanning over `libraryfolders.vdf`.
//!
//! Sunsync only needs the flattened set of app ids across every library
//! folder; names come from the store lookup afterwards.

use std::collections::BTreeSet;
use std::path::Path;

use crate::SteamError;
use crate::vdf::{KeyValues, load_vdf};

/// Loads the set of installed app ids from a `libraryfolders.vdf` file.
///
/// App ids are collected from the `apps` block of every library folder
/// and deduplicated. Folders without an `apps` block are skipped.
pub fn load_installed_app_ids(library_vdf_path: &Path) -> Result<Vec<String>, SteamError> {
    if !library_vdf_path.exists() {
        return Err(SteamError::LibraryNotFound(
            library_vdf_path.display().to_string(),
        ));
    }

    let (root_key, root) = load_vdf(library_vdf_path)?;

    if !root_key.eq_ignore_ascii_case("libraryfolders") {
        return Err(SteamError::Vdf(format!(
            "expected root key 'libraryfolders', got '{root_key}'"
        )));
    }

    Ok(collect_app_ids(&root))
}

/// Flattens app ids across all library folders, in sorted order.
fn collect_app_ids(root: &KeyValues) -> Vec<String> {
    let mut ids = BTreeSet::new();

    let Some(folders) = root.entries() else {
        return Vec::new();
    };

    for (_, folder) in folders {
        let Some(apps) = folder.get("apps").and_then(KeyValues::entries) else {
            continue;
        };
        for (app_id, _) in apps {
            ids.insert(app_id.clone());
        }
    }

    let ids: Vec<String> = ids.into_iter().collect();
    tracing::debug!(count = ids.len(), "collected installed app ids");
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vdf::parse;

    fn ids_from(input: &str) -> Vec<String> {
        let (_, root) = parse(input).unwrap();
        collect_app_ids(&root)
    }

    #[test]
    fn collects_across_folders() {
        let ids = ids_from(
            r#""libraryfolders"
            {
                "0" { "path" "/a" "apps" { "220" "1" "440" "2" } }
                "1" { "path" "/b" "apps" { "730" "3" } }
            }"#,
        );
        assert_eq!(ids, vec!["220", "440", "730"]);
    }

    #[test]
    fn deduplicates_shared_apps() {
        let ids = ids_from(
            r#""libraryfolders"
            {
                "0" { "apps" { "220" "1" } }
                "1" { "apps" { "220" "1" } }
            }"#,
        );
        assert_eq!(ids, vec!["220"]);
    }

    #[test]
    fn skips_folders_without_apps() {
        let ids = ids_from(
            r#""libraryfolders"
            {
                "contentstatsid" "12345"
                "0" { "path" "/a" }
                "1" { "apps" { "990" "0" } }
            }"#,
        );
        assert_eq!(ids, vec!["990"]);
    }

    #[test]
    fn empty_library() {
        let ids = ids_from(r#""libraryfolders" { }"#);
        assert!(ids.is_empty());
    }

    #[test]
    fn rejects_wrong_root_key() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("libraryfolders.vdf");
        std::fs::write(&path, r#""appstate" { }"#).unwrap();

        let err = load_installed_app_ids(&path).unwrap_err();
        assert!(matches!(err, SteamError::Vdf(_)));
    }

    #[test]
    fn missing_file_is_library_not_found() {
        let err = load_installed_app_ids(Path::new("/nonexistent/libraryfolders.vdf")).unwrap_err();
        assert!(matches!(err, SteamError::LibraryNotFound(_)));
    }

    #[test]
    fn loads_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("libraryfolders.vdf");
        std::fs::write(
            &path,
            "\"libraryfolders\"\n{\n\t\"0\"\n\t{\n\t\t\"apps\"\n\t\t{\n\t\t\t\"400\"\t\"0\"\n\t\t}\n\t}\n}\n",
        )
        .unwrap();

        let ids = load_installed_app_ids(&path).unwrap();
        assert_eq!(ids, vec!["400"]);
    }
}

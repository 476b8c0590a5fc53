//! Top-level sync pass: one load, one reconciliation, one save.
//!
//! Per-item failures (a name that will not resolve, artwork that will not
//! download) degrade that item only; the pass itself fails only on
//! filesystem or configuration problems.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use sunsync_process::platform_restarter;
use sunsync_steam::{LaunchMode, NameCache, StoreClient, load_installed_app_ids, resolve_names};
use sunsync_steamgriddb as griddb;
use sunsync_sunshine::config as apps_config;
use sunsync_sunshine::reconcile::{new_games, reconcile, remove_stale_artwork};
use sunsync_sunshine::{AppEntry, dedupe_apps};

use crate::config::Config;

/// Wait after relaunching Steam so the library is readable again.
const STEAM_STARTUP_WAIT: Duration = Duration::from_secs(10);

/// Per-run behavior switches from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Skip the Steam and Sunshine restarts.
    pub no_restart: bool,
    /// Compute and report changes without writing anything.
    pub dry_run: bool,
}

/// Runs one full sync pass.
pub async fn run(config: Config, options: Options) -> anyhow::Result<()> {
    if !options.no_restart {
        restart_launcher("Steam", config.steam_exe_path.as_deref(), STEAM_STARTUP_WAIT).await;
    }

    let installed_ids = load_installed_app_ids(&config.library_vdf_path)?;
    tracing::info!(count = installed_ids.len(), "found installed Steam apps");

    let store = StoreClient::new()?;
    let cache = Arc::new(Mutex::new(NameCache::default()));
    // id -> name; apps the store cannot name are treated as not installed.
    let installed = resolve_names(&store, &installed_ids, cache).await;

    let mut apps = apps_config::load(&config.apps_json_path)?;

    let deduped = dedupe_apps(std::mem::take(&mut apps.apps));
    for dup in &deduped.removed {
        tracing::info!(name = dup.name(), "removing duplicate entry");
    }

    let reconciled = reconcile(deduped.kept, &installed);
    for (name, app_id) in &reconciled.removed_games {
        tracing::info!(name = %name, app_id, "removing uninstalled game");
    }

    let add_ids = new_games(&installed, &reconciled.matched);
    for app_id in &add_ids {
        let name = installed.get(app_id).map(String::as_str).unwrap_or("");
        tracing::info!(name, app_id, "adding new game");
    }

    let changes_needed = !deduped.removed.is_empty()
        || !reconciled.removed_games.is_empty()
        || !add_ids.is_empty();

    if !changes_needed {
        tracing::info!("no changes needed, apps config is up to date");
        return Ok(());
    }

    if options.dry_run {
        tracing::info!(
            duplicates = deduped.removed.len(),
            removed = reconciled.removed_games.len(),
            added = add_ids.len(),
            "dry run, not writing changes"
        );
        return Ok(());
    }

    remove_stale_artwork(&reconciled.stale_artwork);
    apps.apps = reconciled.kept;

    if !add_ids.is_empty() {
        let client = griddb::Client::new(&config.griddb_api_key)?;
        std::fs::create_dir_all(&config.grids_folder)?;

        let launch_mode = LaunchMode::detect();
        let grids = griddb::fetch_grids(&client, &add_ids, &config.grids_folder).await;

        for app_id in &add_ids {
            let Some(name) = installed.get(app_id) else {
                continue;
            };

            let image_path = grids
                .get(app_id)
                .and_then(Option::as_ref)
                .map(|p| p.display().to_string())
                .unwrap_or_default();

            apps.apps.push(AppEntry::new_steam_app(
                name,
                &launch_mode.command_for(app_id),
                &image_path,
            ));
        }
    }

    // Safety net for any collision introduced by the add phase.
    let final_pass = dedupe_apps(std::mem::take(&mut apps.apps));
    apps.apps = final_pass.kept;

    apps_config::save(&config.apps_json_path, &apps)?;

    if !options.no_restart {
        restart_launcher(
            "Sunshine",
            config.sunshine_exe_path.as_deref(),
            Duration::ZERO,
        )
        .await;
    }

    Ok(())
}

/// Restarts a launcher executable, best effort.
///
/// A missing path means restarts were not configured for this launcher;
/// a failed restart is logged and never fails the sync pass.
async fn restart_launcher(label: &str, exe_path: Option<&std::path::Path>, wait: Duration) {
    let Some(exe_path) = exe_path else {
        tracing::debug!(label, "no executable configured, skipping restart");
        return;
    };

    tracing::info!(label, path = %exe_path.display(), "restarting");

    let exe_path = exe_path.to_path_buf();
    let result = tokio::task::spawn_blocking(move || {
        let restarter = platform_restarter(wait);
        restarter.restart(&exe_path)
    })
    .await;

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(label, error = %e, "restart failed, continuing"),
        Err(e) => tracing::warn!(label, error = %e, "restart task failed, continuing"),
    }
}

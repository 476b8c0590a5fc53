//! Launch-command handling: run-id extraction and command construction.

use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;

/// Flatpak application id of the sandboxed Steam client.
const FLATPAK_STEAM_APP: &str = "com.valvesoftware.Steam";

static RUN_GAME_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)steam://rungameid/(\d+)").expect("valid regex"));

/// Extracts the Steam app id from a launch command, if present.
///
/// Matches the `steam://rungameid/<id>` URI anywhere in the command,
/// case-insensitively. Commands without the pattern yield `None`.
pub fn extract_app_id(cmd: &str) -> Option<String> {
    RUN_GAME_ID.captures(cmd).map(|c| c[1].to_string())
}

/// How Steam is invoked on this machine.
///
/// Detected once per run; every generated launch command reuses the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// The OS resolves the `steam://` URI scheme directly (Windows).
    Uri,
    /// Steam runs inside the Flatpak sandbox.
    Flatpak,
    /// A native `steam` binary is on the PATH.
    Native,
}

impl LaunchMode {
    /// Detects the appropriate launch mode for the current platform.
    pub fn detect() -> Self {
        if cfg!(target_os = "windows") {
            return LaunchMode::Uri;
        }

        if flatpak_steam_installed() {
            tracing::debug!("detected Flatpak Steam, using sandboxed launch commands");
            LaunchMode::Flatpak
        } else {
            LaunchMode::Native
        }
    }

    /// Builds the launch command for an app id.
    pub fn command_for(&self, app_id: &str) -> String {
        match self {
            LaunchMode::Uri => format!("steam://rungameid/{app_id}"),
            LaunchMode::Flatpak => {
                format!("flatpak run {FLATPAK_STEAM_APP} steam://rungameid/{app_id}")
            }
            LaunchMode::Native => format!("steam steam://rungameid/{app_id}"),
        }
    }
}

/// Returns true if the Steam Flatpak is installed.
fn flatpak_steam_installed() -> bool {
    let output = Command::new("flatpak")
        .args(["list", "--app", "--columns=application"])
        .output();

    match output {
        Ok(out) => String::from_utf8_lossy(&out.stdout)
            .lines()
            .any(|line| line.trim() == FLATPAK_STEAM_APP),
        // flatpak binary missing or not runnable.
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_plain_uri() {
        assert_eq!(
            extract_app_id("steam://rungameid/220"),
            Some("220".to_string())
        );
    }

    #[test]
    fn extract_from_wrapped_command() {
        assert_eq!(
            extract_app_id("flatpak run com.valvesoftware.Steam steam://rungameid/440"),
            Some("440".to_string())
        );
        assert_eq!(
            extract_app_id("steam steam://rungameid/730"),
            Some("730".to_string())
        );
    }

    #[test]
    fn extract_is_case_insensitive() {
        assert_eq!(
            extract_app_id("STEAM://RunGameId/990"),
            Some("990".to_string())
        );
    }

    #[test]
    fn extract_absent() {
        assert_eq!(extract_app_id(""), None);
        assert_eq!(extract_app_id("/usr/bin/firefox"), None);
        assert_eq!(extract_app_id("steam://rungameid/"), None);
        assert_eq!(extract_app_id("steam://rungameid/abc"), None);
    }

    #[test]
    fn commands_per_mode() {
        assert_eq!(
            LaunchMode::Uri.command_for("220"),
            "steam://rungameid/220"
        );
        assert_eq!(
            LaunchMode::Flatpak.command_for("220"),
            "flatpak run com.valvesoftware.Steam steam://rungameid/220"
        );
        assert_eq!(
            LaunchMode::Native.command_for("220"),
            "steam steam://rungameid/220"
        );
    }

    #[test]
    fn generated_commands_round_trip_extraction() {
        for mode in [LaunchMode::Uri, LaunchMode::Flatpak, LaunchMode::Native] {
            let cmd = mode.command_for("12345");
            assert_eq!(extract_app_id(&cmd), Some("12345".to_string()));
        }
    }
}

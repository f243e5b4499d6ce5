//! Presence check for the Firebase CLI used to deploy the downloaded project.

use std::process::Command;

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliStatus {
    Installed { version: String },
    /// Found on PATH but `firebase --version` failed.
    Broken,
    Missing,
}

impl CliStatus {
    pub fn is_installed(&self) -> bool {
        matches!(self, CliStatus::Installed { .. })
    }
}

pub fn check() -> CliStatus {
    let Ok(path) = which::which("firebase") else {
        return CliStatus::Missing;
    };
    debug!(path = %path.display(), "found firebase CLI");

    match Command::new(&path).arg("--version").output() {
        Ok(output) if output.status.success() => CliStatus::Installed {
            version: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        },
        _ => CliStatus::Broken,
    }
}

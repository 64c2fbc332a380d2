use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Where finished session logs are written, `$HOME/.local/state/slidehelm/logs`
    /// when a home directory is known.
    pub fn log_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("slidehelm");
            Some(state_dir.join("logs"))
        } else {
            ProjectDirs::from("", "", "slidehelm")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("logs"))
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "slidehelm").map(|pd| pd.config_dir().join("config.json"))
    }
}

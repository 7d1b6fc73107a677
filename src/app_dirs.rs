use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("wordrush"),
            )
        } else {
            ProjectDirs::from("", "", "wordrush").map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn token_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("token"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("wordrush.log"))
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "wordrush").map(|pd| pd.config_dir().join("config.json"))
    }
}

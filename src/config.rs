use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;
use crate::grid::{TOTAL_ATTEMPTS, WORD_LENGTH};
use crate::session::{SessionConfig, REDIRECT_DELAY_MS};
use crate::timer::{GAME_DURATION_MS, TICK_STEP_MS};

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const MAX_TOTAL_ATTEMPTS: usize = 20;
pub const MAX_WORD_LENGTH: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub total_attempts: usize,
    pub word_length: usize,
    pub game_duration_secs: u64,
    pub redirect_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            total_attempts: TOTAL_ATTEMPTS,
            word_length: WORD_LENGTH,
            game_duration_secs: GAME_DURATION_MS / 1000,
            redirect_delay_ms: REDIRECT_DELAY_MS,
            request_timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            total_attempts: self.total_attempts.clamp(1, MAX_TOTAL_ATTEMPTS),
            word_length: self.word_length.clamp(1, MAX_WORD_LENGTH),
            game_duration_ms: self.game_duration_secs.max(1) * 1000,
            tick_step_ms: TICK_STEP_MS,
            redirect_delay: Duration::from_millis(self.redirect_delay_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("wordrush_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"api_url":"https://words.example.com"}"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.api_url, "https://words.example.com");
        assert_eq!(cfg.total_attempts, TOTAL_ATTEMPTS);
    }

    #[test]
    fn session_config_from_config() {
        let cfg = Config {
            total_attempts: 6,
            word_length: 4,
            game_duration_secs: 90,
            redirect_delay_ms: 500,
            ..Config::default()
        };
        let session = cfg.session_config();
        assert_eq!(session.total_attempts, 6);
        assert_eq!(session.word_length, 4);
        assert_eq!(session.game_duration_ms, 90_000);
        assert_eq!(session.redirect_delay, Duration::from_millis(500));
    }

    #[test]
    fn zero_sizes_are_clamped() {
        let cfg = Config {
            total_attempts: 0,
            word_length: 0,
            game_duration_secs: 0,
            ..Config::default()
        };
        let session = cfg.session_config();
        assert_eq!(session.total_attempts, 1);
        assert_eq!(session.word_length, 1);
        assert_eq!(session.game_duration_ms, 1000);
    }

    #[test]
    fn oversized_grid_is_clamped() {
        let cfg = Config {
            total_attempts: 70_000,
            word_length: 500,
            ..Config::default()
        };
        let session = cfg.session_config();
        assert_eq!(session.total_attempts, MAX_TOTAL_ATTEMPTS);
        assert_eq!(session.word_length, MAX_WORD_LENGTH);
    }
}

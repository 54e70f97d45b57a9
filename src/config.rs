use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "tasksync.json";
pub const SERVER_ENV: &str = "TASKSYNC_SERVER";

/// Whether a failed toggle is shown to the user or only logged.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailureVisibility {
    #[default]
    Alert,
    Log,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    pub request_timeout_secs: u64,
    pub toggle_failures: FailureVisibility,
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_secs: 10,
            toggle_failures: FailureVisibility::Alert,
            log_file: PathBuf::from("tasksync.log"),
        }
    }
}

impl Config {
    /// Reads the config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Applies `TASKSYNC_SERVER` and then the `--server` flag on top of the file.
    pub fn with_overrides(mut self, env_server: Option<String>, cli_server: Option<&str>) -> Self {
        if let Some(url) = env_server.filter(|u| !u.trim().is_empty()) {
            self.server_url = url;
        }
        if let Some(url) = cli_server {
            self.server_url = url.to_string();
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn init(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_string_pretty(&Self::default())?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasksync.json");
        fs::write(&path, r#"{"server_url":"http://tasks:8080","toggle_failures":"log"}"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.server_url, "http://tasks:8080");
        assert_eq!(config.toggle_failures, FailureVisibility::Log);
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasksync.json");
        fs::write(&path, "{not json").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn flag_beats_env_beats_file() {
        let base = Config::default();
        let env = base.clone().with_overrides(Some("http://env".into()), None);
        assert_eq!(env.server_url, "http://env");
        let cli = base.clone().with_overrides(Some("http://env".into()), Some("http://cli"));
        assert_eq!(cli.server_url, "http://cli");
        let blank = base.with_overrides(Some("  ".into()), None);
        assert_eq!(blank.server_url, "http://127.0.0.1:5000");
    }

    #[test]
    fn init_writes_defaults_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasksync.json");
        Config::init(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), Config::default());
        assert!(Config::init(&path).is_err());
    }
}

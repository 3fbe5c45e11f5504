use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    errors::{ChecklistError, Result},
    utils::{
        paths::PathResolver,
        persistence::{ensure_dir, write_atomic},
    },
    wizard::WizardTimings,
};

const API_URL_ENV: &str = "DAILY_CHECKLIST_API_URL";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

/// Keys accepted by `config set`.
pub const SETTABLE_KEYS: [&str; 4] = [
    "api_base_url",
    "activity_name",
    "auto_advance_ms",
    "transition_ms",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub activity_name: String,
    pub auto_advance_ms: u64,
    pub transition_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.into(),
            activity_name: crate::service::DEFAULT_ACTIVITY_NAME.into(),
            auto_advance_ms: 600,
            transition_ms: 300,
            session_cookie: None,
            username: None,
        }
    }
}

impl Config {
    /// Base URL after applying the environment override.
    pub fn effective_api_url(&self) -> String {
        env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.api_base_url.clone())
    }

    pub fn timings(&self) -> WizardTimings {
        WizardTimings {
            auto_advance: Duration::from_millis(self.auto_advance_ms),
            transition: Duration::from_millis(self.transition_ms),
        }
    }

    pub fn set_field(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "api_base_url" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(ChecklistError::Config(format!(
                        "`{value}` is not an http(s) URL"
                    )));
                }
                self.api_base_url = value.trim_end_matches('/').to_string();
            }
            "activity_name" => {
                if value.is_empty() {
                    return Err(ChecklistError::Config("activity name cannot be empty".into()));
                }
                self.activity_name = value.to_string();
            }
            "auto_advance_ms" => self.auto_advance_ms = parse_millis(key, value)?,
            "transition_ms" => self.transition_ms = parse_millis(key, value)?,
            other => {
                return Err(ChecklistError::Config(format!(
                    "unknown setting `{other}` (expected one of: {})",
                    SETTABLE_KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }

    pub fn display_lines(&self) -> Vec<(String, String)> {
        vec![
            ("api_base_url".into(), self.effective_api_url()),
            ("activity_name".into(), self.activity_name.clone()),
            ("auto_advance_ms".into(), self.auto_advance_ms.to_string()),
            ("transition_ms".into(), self.transition_ms.to_string()),
            (
                "logged_in_as".into(),
                self.username.clone().unwrap_or_else(|| "-".into()),
            ),
        ]
    }
}

fn parse_millis(key: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| ChecklistError::Config(format!("`{key}` expects milliseconds, got `{value}`")))
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::from_base(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        Self::from_base(base)
    }

    fn from_base(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
        })
    }

    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data).map_err(|err| {
            ChecklistError::Config(format!("{}: {}", self.path.display(), err))
        })
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)?;
        debug!(path = %self.path.display(), "config saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.timings(), WizardTimings::default());
    }

    #[test]
    fn save_then_load_keeps_session() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let mut config = Config::default();
        config.session_cookie = Some("abc".into());
        config.username = Some("ana".into());
        config.set_field("transition_ms", "0").unwrap();
        manager.save(&config).unwrap();

        assert_eq!(manager.load().unwrap(), config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        fs::write(manager.path(), r#"{"auto_advance_ms": 0}"#).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config.auto_advance_ms, 0);
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
    }

    #[test]
    fn set_field_validates_input() {
        let mut config = Config::default();
        assert!(config.set_field("api_base_url", "ftp://x").is_err());
        assert!(config.set_field("auto_advance_ms", "soon").is_err());
        assert!(config.set_field("theme", "dark").is_err());
        config
            .set_field("api_base_url", "https://log.example.com/")
            .unwrap();
        assert_eq!(config.api_base_url, "https://log.example.com");
    }
}

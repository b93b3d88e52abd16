//! Runtime configuration: an optional RON file, then `DOCWATCH_*` overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use docwatch_engine::{system_clock, FetchSettings, WatchSettings};
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "docwatch.ron";
const DEFAULT_PAGE_URL: &str = "http://knvsh.gov.spb.ru/gosuslugi/svedeniya2/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub page_url: String,
    pub poll_interval_secs: u64,
    pub fetch_timeout_secs: u64,
    pub shutdown_timeout_secs: u64,
    pub delete_attempts: u32,
    pub delete_retry_backoff_secs: u64,
    /// `None` keeps requests in memory only; they are lost on exit.
    pub state_file: Option<PathBuf>,
    /// `None` logs to the terminal only.
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            page_url: DEFAULT_PAGE_URL.to_string(),
            poll_interval_secs: 60,
            fetch_timeout_secs: 30,
            shutdown_timeout_secs: 10,
            delete_attempts: 3,
            delete_retry_backoff_secs: 2,
            state_file: Some(PathBuf::from("docwatch_state.ron")),
            log_file: Some(PathBuf::from("app.log")),
        }
    }
}

impl AppConfig {
    /// Reads `path` if given (it must exist), else `docwatch.ron` when present,
    /// then applies environment overrides and validates.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_ron(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_ron(text: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(url) = var("DOCWATCH_PAGE_URL") {
            self.page_url = url;
        }
        if let Some(secs) = var("DOCWATCH_POLL_INTERVAL_SECS") {
            self.poll_interval_secs = parse_secs("DOCWATCH_POLL_INTERVAL_SECS", &secs)?;
        }
        if let Some(secs) = var("DOCWATCH_FETCH_TIMEOUT_SECS") {
            self.fetch_timeout_secs = parse_secs("DOCWATCH_FETCH_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = var("DOCWATCH_SHUTDOWN_TIMEOUT_SECS") {
            self.shutdown_timeout_secs = parse_secs("DOCWATCH_SHUTDOWN_TIMEOUT_SECS", &secs)?;
        }
        if let Some(file) = var("DOCWATCH_STATE_FILE") {
            self.state_file = optional_path(&file);
        }
        if let Some(file) = var("DOCWATCH_LOG_FILE") {
            self.log_file = optional_path(&file);
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(&self.page_url)
            .with_context(|| format!("page_url {:?} is not a valid URL", self.page_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("page_url must be http or https, got {}", url.scheme());
        }
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be greater than zero");
        }
        if self.fetch_timeout_secs == 0 {
            bail!("fetch_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            request_timeout: Duration::from_secs(self.fetch_timeout_secs),
            ..FetchSettings::default()
        }
    }

    pub fn watch_settings(&self) -> WatchSettings {
        WatchSettings {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            delete_attempts: self.delete_attempts,
            delete_retry_backoff: Duration::from_secs(self.delete_retry_backoff_secs),
            shutdown_timeout: Duration::from_secs(self.shutdown_timeout_secs),
            clock: system_clock(),
        }
    }
}

/// An empty value switches the file off.
fn optional_path(value: &str) -> Option<PathBuf> {
    if value.trim().is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

fn parse_secs(key: &str, value: &str) -> anyhow::Result<u64> {
    value
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a whole number of seconds, got {value:?}"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::AppConfig;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.watch_settings().poll_interval, Duration::from_secs(60));
        assert_eq!(config.fetch_settings().request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let config = AppConfig::from_ron("(poll_interval_secs: 15, log_file: None)").unwrap();
        assert_eq!(config.poll_interval_secs, 15);
        assert_eq!(config.log_file, None);
        assert_eq!(config.page_url, AppConfig::default().page_url);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = AppConfig::from_ron("(poll_interval_secs: 15)").unwrap();
        config
            .apply_env(env(&[
                ("DOCWATCH_POLL_INTERVAL_SECS", " 120 "),
                ("DOCWATCH_PAGE_URL", "https://example.test/list"),
                ("DOCWATCH_STATE_FILE", "/var/lib/docwatch/state.ron"),
                ("DOCWATCH_LOG_FILE", ""),
            ]))
            .unwrap();

        assert_eq!(config.poll_interval_secs, 120);
        assert_eq!(config.page_url, "https://example.test/list");
        assert_eq!(
            config.state_file,
            Some(PathBuf::from("/var/lib/docwatch/state.ron"))
        );
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn empty_state_file_means_memory_only() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("DOCWATCH_STATE_FILE", " ")])).unwrap();
        assert_eq!(config.state_file, None);

        let config = AppConfig::from_ron("(state_file: None)").unwrap();
        assert_eq!(config.state_file, None);
    }

    #[test]
    fn bad_numbers_in_env_are_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(env(&[("DOCWATCH_FETCH_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("DOCWATCH_FETCH_TIMEOUT_SECS"));
    }

    #[test]
    fn zero_interval_and_bad_url_fail_validation() {
        let config = AppConfig {
            poll_interval_secs: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            page_url: "knvsh.gov.spb.ru".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            page_url: "ftp://example.test/".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

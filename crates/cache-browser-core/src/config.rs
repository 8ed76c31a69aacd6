//! Console configuration.
//!
//! Values resolve in three layers: built-in defaults, an optional TOML
//! file, then environment overrides.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Built-in defaults.
pub mod defaults {
    pub const BASE_URL: &str = "http://localhost:8080";
    pub const NAMESPACE: &str = "default";
    pub const REGISTRY_BASE_PATH: &str = "/console";
    /// Version of the newest shipped release.
    pub const VERSION: &str = "v0.1.3";
    pub const APP_DIR: &str = "cache-browser";
    pub const PREFERENCES_FILE: &str = "preferences.json";
}

/// Timing budgets, in milliseconds unless stated otherwise.
pub mod timeouts {
    pub const READY_MS: u64 = 10_000;
    pub const EXTENSION_ATTACH_MS: u64 = 10_000;
    pub const FILTER_DEBOUNCE_MS: u64 = 150;
    pub const REQUEST_SECS: u64 = 30;
}

/// Environment variable names.
pub mod env_vars {
    pub const BASE_URL: &str = "CACHE_BROWSER_BASE_URL";
    pub const NAMESPACE: &str = "CACHE_BROWSER_NAMESPACE";
    pub const SHORTCUTS: &str = "CACHE_BROWSER_SHORTCUTS";
    pub const PREFERENCES: &str = "CACHE_BROWSER_PREFERENCES";
    pub const LOG_JSON: &str = "CACHE_BROWSER_LOG_JSON";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Root URL of the cache service.
    pub base_url: String,
    pub default_namespace: String,
    pub registry_base_path: String,
    pub default_version: String,
    /// Shortcut definitions document. Built-in shortcuts apply when unset.
    pub shortcuts_path: Option<PathBuf>,
    pub preferences_path: Option<PathBuf>,
    pub ready_timeout_ms: u64,
    pub extension_timeout_ms: u64,
    pub filter_debounce_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            default_namespace: defaults::NAMESPACE.to_string(),
            registry_base_path: defaults::REGISTRY_BASE_PATH.to_string(),
            default_version: defaults::VERSION.to_string(),
            shortcuts_path: None,
            preferences_path: None,
            ready_timeout_ms: timeouts::READY_MS,
            extension_timeout_ms: timeouts::EXTENSION_ATTACH_MS,
            filter_debounce_ms: timeouts::FILTER_DEBOUNCE_MS,
            request_timeout_secs: timeouts::REQUEST_SECS,
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from an optional TOML file, then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        tracing::debug!(path = %path.display(), "Loaded console configuration");
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(env_vars::BASE_URL).filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        if let Some(ns) = lookup(env_vars::NAMESPACE).filter(|v| !v.is_empty()) {
            self.default_namespace = ns;
        }
        if let Some(path) = lookup(env_vars::SHORTCUTS).filter(|v| !v.is_empty()) {
            self.shortcuts_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup(env_vars::PREFERENCES).filter(|v| !v.is_empty()) {
            self.preferences_path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::Config("base_url must not be empty".into()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.default_namespace.trim().is_empty() {
            return Err(Error::Config("default_namespace must not be empty".into()));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Where the width preference lives.
    pub fn preferences_path(&self) -> PathBuf {
        self.preferences_path.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(defaults::APP_DIR)
                .join(defaults::PREFERENCES_FILE)
        })
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn extension_timeout(&self) -> Duration {
        Duration::from_millis(self.extension_timeout_ms)
    }

    pub fn filter_debounce(&self) -> Duration {
        Duration::from_millis(self.filter_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ConsoleConfig::default();
        assert_eq!(config.default_namespace, "default");
        assert_eq!(config.default_version, "v0.1.3");
        assert_eq!(config.ready_timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.toml");
        std::fs::write(&path, "base_url = \"https://cache.example.com/\"\nfilter_debounce_ms = 50\n").unwrap();

        let config = ConsoleConfig::from_file(&path).unwrap();
        assert_eq!(config.base_url(), "https://cache.example.com");
        assert_eq!(config.filter_debounce(), Duration::from_millis(50));
        assert_eq!(config.registry_base_path, "/console");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (env_vars::BASE_URL, "http://10.0.0.2:9000"),
            (env_vars::NAMESPACE, "staging"),
            (env_vars::SHORTCUTS, ""),
        ]
        .into_iter()
        .collect();

        let mut config = ConsoleConfig::default();
        config.apply_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.base_url, "http://10.0.0.2:9000");
        assert_eq!(config.default_namespace, "staging");
        assert_eq!(config.shortcuts_path, None);
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let config = ConsoleConfig {
            base_url: "ftp://cache".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}

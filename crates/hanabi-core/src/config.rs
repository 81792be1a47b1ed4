use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Overrides the metadata GraphQL endpoint.
pub const ENV_METADATA_URL: &str = "HANABI_METADATA_URL";
/// Sets the resolver endpoint and turns enrichment on.
pub const ENV_RESOLVER_URL: &str = "HANABI_RESOLVER_URL";
/// Overrides the search quiet window, in milliseconds.
pub const ENV_SEARCH_DEBOUNCE_MS: &str = "HANABI_SEARCH_DEBOUNCE_MS";

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub metadata: MetadataConfig,
    pub enrichment: EnrichmentConfig,
    pub search: SearchConfig,
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    pub api_url: String,
    pub page_size: u32,
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    pub enabled: bool,
    pub api_url: String,
    pub timeout_ms: u64,
    pub match_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    pub placeholder_url: String,
}

impl EnrichmentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl AppConfig {
    /// Load config: user file (if exists) or built-in defaults, then
    /// environment overrides.
    pub fn load() -> Result<Self, CatalogError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a specific file, falling back to defaults when it is absent.
    pub fn load_from(path: &Path) -> Result<Self, CatalogError> {
        if path.exists() {
            let user_str =
                std::fs::read_to_string(path).map_err(|e| CatalogError::Config(e.to_string()))?;
            toml::from_str(&user_str).map_err(|e| CatalogError::Config(e.to_string()))
        } else {
            toml::from_str(DEFAULT_CONFIG).map_err(|e| CatalogError::Config(e.to_string()))
        }
    }

    /// Apply `HANABI_*` overrides from `lookup` (normally the process env).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_METADATA_URL).filter(|v| !v.trim().is_empty()) {
            self.metadata.api_url = url;
        }
        if let Some(url) = lookup(ENV_RESOLVER_URL).filter(|v| !v.trim().is_empty()) {
            self.enrichment.api_url = url;
            self.enrichment.enabled = true;
        }
        if let Some(raw) = lookup(ENV_SEARCH_DEBOUNCE_MS) {
            match raw.trim().parse() {
                Ok(ms) => self.search.debounce_ms = ms,
                Err(_) => tracing::warn!(value = %raw, "Ignoring invalid search debounce override"),
            }
        }
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), CatalogError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), CatalogError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CatalogError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", "hanabi")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = AppConfig::default();
        assert_eq!(config.metadata.api_url, "https://graphql.anilist.co");
        assert_eq!(config.metadata.page_size, 20);
        assert!(!config.enrichment.enabled);
        assert_eq!(config.enrichment.timeout(), Duration::from_millis(4000));
        assert_eq!(config.search.debounce_ms, 300);
        assert!(config.playback.placeholder_url.ends_with(".mp4"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_METADATA_URL, "http://mirror/graphql"),
            (ENV_RESOLVER_URL, "http://resolver/anime/zoro"),
            (ENV_SEARCH_DEBOUNCE_MS, "150"),
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.metadata.api_url, "http://mirror/graphql");
        assert_eq!(config.enrichment.api_url, "http://resolver/anime/zoro");
        assert!(config.enrichment.enabled);
        assert_eq!(config.search.debounce_ms, 150);
    }

    #[test]
    fn test_invalid_debounce_override_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides(|k| (k == ENV_SEARCH_DEBOUNCE_MS).then(|| "soon".to_string()));
        assert_eq!(config.search.debounce_ms, 300);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.metadata.page_size = 50;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.metadata.page_size, 50);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.metadata.page_size, 20);
    }
}

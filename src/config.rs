//! Configuration Management
//!
//! Reads the Scaleway CLI profile (`<config_dir>/scw/config.yaml`) and applies
//! the usual `SCW_*` environment overrides on top of it.

use crate::scw::client::DEFAULT_API_URL;
use crate::scw::region::{Region, RegionError};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Credentials and defaults
#[derive(Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_organization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("default_organization_id", &self.default_organization_id)
            .field("default_project_id", &self.default_project_id)
            .field("default_region", &self.default_region)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("SCW_CONFIG_PATH") {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|p| p.join("scw").join("config.yaml"))
    }

    /// Load configuration from disk, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a YAML profile
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Override fields from `SCW_*` variables (env > file)
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fields: [(&str, &mut Option<String>); 6] = [
            ("SCW_ACCESS_KEY", &mut self.access_key),
            ("SCW_SECRET_KEY", &mut self.secret_key),
            ("SCW_DEFAULT_ORGANIZATION_ID", &mut self.default_organization_id),
            ("SCW_DEFAULT_PROJECT_ID", &mut self.default_project_id),
            ("SCW_DEFAULT_REGION", &mut self.default_region),
            ("SCW_API_URL", &mut self.api_url),
        ];
        for (key, field) in fields {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *field = Some(value);
            }
        }
    }

    /// Get effective region (env > config > fr-par)
    pub fn effective_region(&self) -> Result<Region, RegionError> {
        match self.default_region.as_deref() {
            Some(region) => region.parse(),
            None => Ok(Region::DEFAULT),
        }
    }

    /// Get effective API endpoint
    pub fn effective_api_url(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_effective_region_defaults_to_paris() {
        assert_eq!(Config::default().effective_region().unwrap(), Region::FR_PAR);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config {
            default_region: Some("nl-ams".to_string()),
            secret_key: Some("from-file".to_string()),
            ..Config::default()
        };
        let env: HashMap<&str, &str> = [("SCW_DEFAULT_REGION", "pl-waw"), ("SCW_SECRET_KEY", "")]
            .into_iter()
            .collect();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.effective_region().unwrap(), Region::PL_WAW);
        // Empty variables do not erase file values
        assert_eq!(config.secret_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_parse_cli_profile() {
        let yaml = "access_key: SCWXXXXXXXXXXXXXXXXX\nsecret_key: 11111111-1111-1111-1111-111111111111\ndefault_region: fr-srr\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.effective_region().unwrap(), Region::FR_SRR);
        assert_eq!(config.effective_api_url(), DEFAULT_API_URL);
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("scw-rdb-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yaml");
        let config = Config {
            default_project_id: Some("11111111-1111-1111-1111-111111111111".to_string()),
            default_region: Some("nl-ams".to_string()),
            ..Config::default()
        };
        std::fs::write(&path, serde_yaml::to_string(&config).unwrap()).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = Config {
            secret_key: Some("super-secret".to_string()),
            ..Config::default()
        };
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}

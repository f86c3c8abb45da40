//! Execution context shared by every resource operation
//!
//! [`Meta`] carries the real client factory, the region resolver built from the
//! configured default region, and an optional substitute backend. The binder,
//! [`Meta::rdb_api`], is the only way handlers obtain a backend client.

use super::resolver::RegionResolver;
use crate::config::Config;
use crate::scw::client::ScwClient;
use crate::scw::rdb::{RdbApi, RdbHttpApi};
use crate::scw::region::Region;
use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

/// Inputs needed to build a [`Meta`]
#[derive(Debug, Clone, Default)]
pub struct MetaConfig {
    pub config: Config,
    /// Appended to the user agent of every request
    pub caller_version: String,
}

pub struct Meta {
    client: ScwClient,
    resolver: RegionResolver,
    default_project_id: Option<String>,
    substitute: OnceLock<Arc<dyn RdbApi>>,
}

impl std::fmt::Debug for Meta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Meta")
            .field("client", &self.client)
            .field("resolver", &self.resolver)
            .field("substituted", &self.substitute.get().is_some())
            .finish()
    }
}

impl Meta {
    pub fn new(meta_config: MetaConfig) -> Result<Self> {
        let config = &meta_config.config;
        let default_region = config
            .effective_region()
            .context("Invalid default region in configuration")?;

        let user_agent = if meta_config.caller_version.is_empty() {
            format!("scw-rdb/{}", env!("CARGO_PKG_VERSION"))
        } else {
            format!(
                "scw-rdb/{} ({})",
                env!("CARGO_PKG_VERSION"),
                meta_config.caller_version
            )
        };

        let client = ScwClient::new(
            config.secret_key.as_deref().unwrap_or_default(),
            &config.effective_api_url(),
            &user_agent,
        )?;

        tracing::debug!("Meta built with default region {}", default_region);

        Ok(Self {
            client,
            resolver: RegionResolver::new(default_region),
            default_project_id: config.default_project_id.clone(),
            substitute: OnceLock::new(),
        })
    }

    /// Install a backend used instead of the real API for every region
    ///
    /// Only possible once, before the first operation.
    pub fn set_substitute_api(&self, api: Arc<dyn RdbApi>) -> Result<()> {
        self.substitute
            .set(api)
            .map_err(|_| anyhow::anyhow!("a substitute RDB API is already installed"))
    }

    /// Backend client for `region`
    pub fn rdb_api(&self, region: &Region) -> Arc<dyn RdbApi> {
        if let Some(api) = self.substitute.get() {
            return Arc::clone(api);
        }
        Arc::new(RdbHttpApi::new(self.client.clone(), region.clone()))
    }

    pub fn resolver(&self) -> &RegionResolver {
        &self.resolver
    }

    pub fn default_region(&self) -> &Region {
        self.resolver.default_region()
    }

    pub fn default_project_id(&self) -> Option<&str> {
        self.default_project_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scw::memory::InMemoryRdbApi;

    #[test]
    fn test_default_meta_uses_paris() {
        let meta = Meta::new(MetaConfig::default()).unwrap();
        assert_eq!(meta.default_region(), &Region::FR_PAR);
    }

    #[test]
    fn test_substitute_can_only_be_set_once() {
        let meta = Meta::new(MetaConfig::default()).unwrap();
        meta.set_substitute_api(Arc::new(InMemoryRdbApi::new())).unwrap();
        assert!(meta
            .set_substitute_api(Arc::new(InMemoryRdbApi::new()))
            .is_err());
    }

    #[test]
    fn test_binder_returns_substitute_for_any_region() {
        let meta = Meta::new(MetaConfig::default()).unwrap();
        let api: Arc<dyn RdbApi> = Arc::new(InMemoryRdbApi::new());
        meta.set_substitute_api(Arc::clone(&api)).unwrap();

        for region in [Region::FR_PAR, Region::NL_AMS] {
            assert!(Arc::ptr_eq(&meta.rdb_api(&region), &api));
        }
    }

    #[test]
    fn test_invalid_default_region_fails() {
        let config = Config {
            default_region: Some("mars-01".to_string()),
            ..Config::default()
        };
        let err = Meta::new(MetaConfig {
            config,
            caller_version: String::new(),
        })
        .unwrap_err();
        assert!(format!("{:#}", err).contains("mars-01"));
    }
}

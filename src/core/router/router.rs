//! The router value
//!
//! Owns the snapshot store and exposes the two admin operations (reload,
//! snapshot) next to the matching entry point implemented in
//! [`matcher`](super::matcher). There is no process-wide instance: the
//! embedding proxy constructs a `Router` and hands it to its request
//! handlers, and tests construct fresh ones.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{ConfigError, ProxyConfig};
use crate::core::router::builder::build_maps;
use crate::core::router::snapshot::{CowMaps, Maps};

/// Startup options for [`Router::bootstrap`]
#[derive(Debug, Clone, Default)]
pub struct BootstrapOptions {
    /// Path of the YAML routing document
    pub config_file: PathBuf,
    /// Optional JSON cache file for best-effort warm start
    pub cache_file: Option<PathBuf>,
}

/// Routing core: snapshot store plus admin surface
#[derive(Debug, Default)]
pub struct Router {
    maps: CowMaps,
}

impl Router {
    /// Create a router with empty routing state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a router from an already parsed configuration document
    pub fn with_config(config: &ProxyConfig) -> Result<Self, ConfigError> {
        let router = Self::new();
        router.reload(config)?;
        Ok(router)
    }

    // ========== Admin Surface ==========

    /// Replace the routing state with a new configuration
    ///
    /// Transactional: on any validation error the previously published
    /// snapshot keeps serving and the error is returned to the operator.
    pub fn reload(&self, config: &ProxyConfig) -> Result<(), ConfigError> {
        let maps = build_maps(config)?;
        let hosts = maps.host_count();
        self.maps.replace(maps);
        info!(services = config.services.len(), hosts, "configuration reloaded");
        Ok(())
    }

    /// The current snapshot, for introspection and tests
    pub fn snapshot(&self) -> Arc<Maps> {
        self.maps.get()
    }

    /// Copy-mutate-publish against the current snapshot
    ///
    /// The mutator receives a deep copy it may change freely; in-flight
    /// readers keep the snapshot they started with.
    pub fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut Maps),
    {
        self.maps.update(mutate);
    }

    // ========== Cache File ==========

    /// Warm the routing state from a JSON cache file
    ///
    /// The cache is best-effort: it is never trusted over the YAML document
    /// and a subsequent [`Router::reload`] replaces it entirely.
    pub async fn load_cache<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let mut maps: Maps = serde_json::from_slice(&data)?;
        maps.rebuild_balancers();
        let hosts = maps.host_count();
        self.maps.replace(maps);
        info!(path = %path.display(), hosts, "routing state warmed from cache");
        Ok(())
    }

    /// Persist the current snapshot to a JSON cache file
    ///
    /// Called by the embedding proxy's save loop; the core knows nothing
    /// about timers.
    pub async fn save_cache<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let data = serde_json::to_vec(&*self.snapshot())?;
        tokio::fs::write(path, data).await?;
        info!(path = %path.display(), "routing state cached");
        Ok(())
    }

    /// Warm from the cache file, then load the YAML document
    ///
    /// Cache failures are logged and ignored; traffic can be served from the
    /// cached state while the YAML loads, and the YAML always wins.
    pub async fn bootstrap(&self, options: &BootstrapOptions) -> Result<(), ConfigError> {
        if let Some(cache) = &options.cache_file {
            if let Err(error) = self.load_cache(cache).await {
                warn!(%error, "cache warm start failed, continuing with empty state");
            }
        }

        let config = ProxyConfig::from_file(&options.config_file).await?;
        self.reload(&config)?;

        if let Some(cache) = &options.cache_file {
            if let Err(error) = self.save_cache(cache).await {
                warn!(%error, "failed to write cache file");
            }
        }
        Ok(())
    }
}

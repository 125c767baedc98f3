//! Registry of compilation configs.
//!
//! # Responsibilities
//! - Hold every config registered at startup, keyed by id
//! - Reject duplicate ids (first registration wins)
//! - Serve lookups from any number of request workers
//!
//! # Design Decisions
//! - Keyed by config *id*, not by the config value: per-request query
//!   overrides can produce multiple distinct configs sharing one id, and
//!   those must never land in the registry
//! - No removal path; entries live for the process lifetime

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::config::schema::Config;

/// Error type for registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A config with the same id has already been registered.
    #[error("a config with this id has already been registered: {id}")]
    DuplicateConfig { id: String },
}

/// A thread-safe registry of configs keyed by id.
#[derive(Clone, Default)]
pub struct ConfigRegistry {
    inner: Arc<DashMap<String, Config>>,
}

impl ConfigRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Register a config.
    ///
    /// Fails if a config with the same id is already present; the existing
    /// entry is retained.
    pub fn register(&self, config: Config) -> Result<(), RegistryError> {
        match self.inner.entry(config.id.clone()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateConfig { id: config.id }),
            Entry::Vacant(slot) => {
                tracing::debug!(config_id = %config.id, "Config registered");
                slot.insert(config);
                Ok(())
            }
        }
    }

    /// Check whether a config with the given id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.inner.contains_key(id)
    }

    /// Look up a config by id, cloning it out of the registry.
    pub fn get(&self, id: &str) -> Option<Config> {
        self.inner.get(id).map(|r| r.value().clone())
    }

    /// Ids of all registered configs.
    pub fn ids(&self) -> Vec<String> {
        self.inner.iter().map(|r| r.key().clone()).collect()
    }

    /// Number of registered configs.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True if nothing has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

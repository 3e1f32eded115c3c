//! Persisted namespace store
//!
//! Wraps the namespace file in a mutex so cache actors can read and rotate
//! tokens without racing each other's flush-to-disk.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::namespace::{AgentRecord, Namespace, NamespaceFile};
use super::{load_config, save_config};
use crate::error::ConfigError;

/// Handle to the on-disk namespace configuration
pub struct ConfigStore {
    path: PathBuf,
    inner: Mutex<NamespaceFile>,
}

impl ConfigStore {
    /// Open a store, loading the file if it exists and starting empty
    /// otherwise.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let inner = match load_config::<NamespaceFile>(&path) {
            Ok(file) => file,
            Err(ConfigError::NotFound(_)) => NamespaceFile::default(),
            Err(e) => return Err(e),
        };

        Ok(Self {
            path,
            inner: Mutex::new(inner),
        })
    }

    /// Open the store at the default path.
    pub fn open_default() -> Result<Self, ConfigError> {
        Self::open(super::default_config_path())
    }

    /// Path this store flushes to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of one namespace
    pub fn namespace(&self, name: &str) -> Result<Namespace, ConfigError> {
        let inner = self.inner.lock().expect("config store lock poisoned");
        inner
            .namespaces
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::NamespaceNotFound(name.to_string()))
    }

    /// Names of all configured namespaces
    pub fn namespace_names(&self) -> Vec<String> {
        let inner = self.inner.lock().expect("config store lock poisoned");
        inner.namespaces.keys().cloned().collect()
    }

    /// Insert or replace a namespace and flush.
    pub fn upsert_namespace(&self, namespace: Namespace) -> Result<(), ConfigError> {
        let mut inner = self.inner.lock().expect("config store lock poisoned");
        inner
            .namespaces
            .insert(namespace.name.clone(), namespace);
        save_config(&self.path, &*inner)
    }

    /// Persist rotated tokens for a namespace and flush.
    pub fn update_tokens(
        &self,
        name: &str,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<(), ConfigError> {
        let mut inner = self.inner.lock().expect("config store lock poisoned");
        let namespace = inner
            .namespaces
            .get_mut(name)
            .ok_or_else(|| ConfigError::NamespaceNotFound(name.to_string()))?;
        namespace.controller.access_token = Some(access_token.to_string());
        namespace.controller.refresh_token = Some(refresh_token.to_string());
        save_config(&self.path, &*inner)
    }

    /// Replace a namespace's agent records and flush.
    pub fn replace_agents(&self, name: &str, agents: Vec<AgentRecord>) -> Result<(), ConfigError> {
        let mut inner = self.inner.lock().expect("config store lock poisoned");
        let namespace = inner
            .namespaces
            .get_mut(name)
            .ok_or_else(|| ConfigError::NamespaceNotFound(name.to_string()))?;
        namespace.agents = agents;
        save_config(&self.path, &*inner)
    }
}

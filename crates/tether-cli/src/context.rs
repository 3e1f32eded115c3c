//! Shared command context
//!
//! Built once per invocation and passed by handle to every executor: the
//! namespace store, the REST client, the cache actors that front it, and
//! the session registry. Nothing here is reachable through globals.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use tether_client::{AgentCache, ClientCache, ControlPlaneApi, InventorySync, RestClient};
use tether_core::config::ConfigStore;
use tether_session::SessionRegistry;

pub struct AppContext {
    pub namespace: String,
    pub store: Arc<ConfigStore>,
    pub api: Arc<RestClient>,
    pub clients: ClientCache,
    pub agents: AgentCache,
    pub sync: InventorySync,
    pub registry: Arc<SessionRegistry>,
}

impl AppContext {
    /// Wire up the store, REST client, and cache actors.
    pub fn init(namespace: String, config_path: Option<PathBuf>) -> Result<Self> {
        let store = Arc::new(match config_path {
            Some(path) => ConfigStore::open(path),
            None => ConfigStore::open_default(),
        }
        .context("Failed to open namespace configuration")?);

        let api = Arc::new(RestClient::new().context("Failed to build controller client")?);
        let api_dyn: Arc<dyn ControlPlaneApi> = Arc::clone(&api) as Arc<dyn ControlPlaneApi>;

        let clients = ClientCache::spawn(Arc::clone(&api_dyn), Arc::clone(&store));
        let agents = AgentCache::spawn(Arc::clone(&api_dyn), clients.clone());
        let sync = InventorySync::spawn(api_dyn, clients.clone(), Arc::clone(&store));

        Ok(Self {
            namespace,
            store,
            api,
            clients,
            agents,
            sync,
            registry: Arc::new(SessionRegistry::new()),
        })
    }
}

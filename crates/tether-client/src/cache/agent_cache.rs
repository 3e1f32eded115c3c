//! Agent-inventory cache actor

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::{CacheError, CacheRequest, ClientCache, CACHE_REQUEST_CAPACITY, INVALIDATE_KEY};
use crate::api::{AgentSummary, ControlPlaneApi};

/// Handle to the agent inventory cache worker.
///
/// A miss lists the backend inventory through the cached client for the
/// namespace; the snapshot then stays sticky until invalidated.
#[derive(Clone)]
pub struct AgentCache {
    tx: mpsc::Sender<CacheRequest<Arc<Vec<AgentSummary>>>>,
}

impl AgentCache {
    /// Spawn the worker task and return a handle to it.
    pub fn spawn(api: Arc<dyn ControlPlaneApi>, clients: ClientCache) -> Self {
        let (tx, rx) = mpsc::channel(CACHE_REQUEST_CAPACITY);
        tokio::spawn(run_worker(api, clients, rx));
        Self { tx }
    }

    /// Get the agent inventory snapshot for a namespace.
    pub async fn agents(&self, namespace: &str) -> Result<Arc<Vec<AgentSummary>>, CacheError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(CacheRequest {
                namespace: namespace.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| CacheError::WorkerGone)?;

        reply_rx
            .await
            .map_err(|_| CacheError::WorkerGone)??
            .ok_or(CacheError::WorkerGone)
    }

    /// Find one agent by name in a namespace's inventory.
    pub async fn agent_by_name(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<AgentSummary>, CacheError> {
        let agents = self.agents(namespace).await?;
        Ok(agents.iter().find(|a| a.name == name).cloned())
    }

    /// Drop every cached inventory snapshot.
    pub async fn invalidate(&self) -> Result<(), CacheError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(CacheRequest {
                namespace: INVALIDATE_KEY.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| CacheError::WorkerGone)?;
        reply_rx.await.map_err(|_| CacheError::WorkerGone)??;
        Ok(())
    }
}

async fn run_worker(
    api: Arc<dyn ControlPlaneApi>,
    clients: ClientCache,
    mut rx: mpsc::Receiver<CacheRequest<Arc<Vec<AgentSummary>>>>,
) {
    let mut inventories: HashMap<String, Arc<Vec<AgentSummary>>> = HashMap::new();

    while let Some(request) = rx.recv().await {
        if request.namespace == INVALIDATE_KEY {
            tracing::debug!(cached = inventories.len(), "Clearing agent cache");
            inventories.clear();
            let _ = request.reply.send(Ok(None));
            continue;
        }

        let result = resolve(&*api, &clients, &mut inventories, &request.namespace).await;
        let _ = request.reply.send(result.map(Some));
    }
}

async fn resolve(
    api: &dyn ControlPlaneApi,
    clients: &ClientCache,
    inventories: &mut HashMap<String, Arc<Vec<AgentSummary>>>,
    namespace: &str,
) -> Result<Arc<Vec<AgentSummary>>, CacheError> {
    if let Some(snapshot) = inventories.get(namespace) {
        return Ok(Arc::clone(snapshot));
    }

    let session = clients.session(namespace).await?;
    let agents = api.list_agents(&session).await?;
    tracing::debug!(namespace = %namespace, count = agents.len(), "Cached agent inventory");

    let snapshot = Arc::new(agents);
    inventories.insert(namespace.to_string(), Arc::clone(&snapshot));
    Ok(snapshot)
}

//! One-shot inventory reconciliation actor

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::{CacheError, ClientCache, CACHE_REQUEST_CAPACITY};
use crate::api::{AgentSummary, ControlPlaneApi};
use tether_core::config::{AgentRecord, ConfigStore};
use tether_core::time::current_time_millis;

struct SyncRequest {
    namespace: String,
    reply: oneshot::Sender<Result<(), CacheError>>,
}

/// Handle to the inventory sync worker.
///
/// Reconciliation runs exactly once per process; later requests are
/// answered without touching the controller.
#[derive(Clone)]
pub struct InventorySync {
    tx: mpsc::Sender<SyncRequest>,
}

impl InventorySync {
    /// Spawn the worker task and return a handle to it.
    pub fn spawn(
        api: Arc<dyn ControlPlaneApi>,
        clients: ClientCache,
        store: Arc<ConfigStore>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(CACHE_REQUEST_CAPACITY);
        tokio::spawn(run_worker(api, clients, store, rx));
        Self { tx }
    }

    /// Reconcile local agent records with the backend inventory.
    pub async fn run(&self, namespace: &str) -> Result<(), CacheError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SyncRequest {
                namespace: namespace.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| CacheError::WorkerGone)?;
        reply_rx.await.map_err(|_| CacheError::WorkerGone)?
    }
}

async fn run_worker(
    api: Arc<dyn ControlPlaneApi>,
    clients: ClientCache,
    store: Arc<ConfigStore>,
    mut rx: mpsc::Receiver<SyncRequest>,
) {
    let mut synced = false;

    while let Some(request) = rx.recv().await {
        if synced {
            let _ = request.reply.send(Ok(()));
            continue;
        }

        let result = reconcile(&*api, &clients, &store, &request.namespace).await;
        if result.is_ok() {
            synced = true;
        }
        let _ = request.reply.send(result);
    }
}

async fn reconcile(
    api: &dyn ControlPlaneApi,
    clients: &ClientCache,
    store: &ConfigStore,
    namespace: &str,
) -> Result<(), CacheError> {
    let session = clients.session(namespace).await?;
    let backend = api.list_agents(&session).await?;
    let local = store.namespace(namespace)?.agents;

    let merged = merge_inventory(local, backend);
    tracing::info!(namespace = %namespace, agents = merged.len(), "Reconciled agent inventory");
    store.replace_agents(namespace, merged)?;
    Ok(())
}

/// Merge backend-authoritative identity and address fields into the local
/// records, preserving locally-known provisioning metadata. Local records
/// the backend does not know about are kept as-is.
fn merge_inventory(local: Vec<AgentRecord>, backend: Vec<AgentSummary>) -> Vec<AgentRecord> {
    let mut merged = local;

    for agent in backend {
        if let Some(record) = merged.iter_mut().find(|r| r.name == agent.name) {
            record.uuid = Some(agent.uuid);
            record.host = agent.host;
        } else {
            merged.push(AgentRecord {
                name: agent.name,
                uuid: Some(agent.uuid),
                host: agent.host,
                created_at_ms: Some(current_time_millis()),
                ..Default::default()
            });
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_local_provisioning_metadata() {
        let local = vec![AgentRecord {
            name: "edge-1".to_string(),
            ssh_user: Some("root".to_string()),
            ssh_port: Some(2222),
            ..Default::default()
        }];
        let backend = vec![AgentSummary {
            uuid: "uuid-1".to_string(),
            name: "edge-1".to_string(),
            host: Some("10.0.0.5".to_string()),
            daemon_status: Some("RUNNING".to_string()),
        }];

        let merged = merge_inventory(local, backend);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].uuid.as_deref(), Some("uuid-1"));
        assert_eq!(merged[0].host.as_deref(), Some("10.0.0.5"));
        assert_eq!(merged[0].ssh_user.as_deref(), Some("root"));
        assert_eq!(merged[0].ssh_port, Some(2222));
    }

    #[test]
    fn test_merge_adds_backend_only_agents() {
        let backend = vec![AgentSummary {
            uuid: "uuid-2".to_string(),
            name: "edge-2".to_string(),
            host: None,
            daemon_status: None,
        }];

        let merged = merge_inventory(Vec::new(), backend);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "edge-2");
        assert_eq!(merged[0].uuid.as_deref(), Some("uuid-2"));
        assert!(merged[0].created_at_ms.is_some());
    }

    #[test]
    fn test_merge_keeps_local_only_agents() {
        let local = vec![AgentRecord {
            name: "not-yet-registered".to_string(),
            ssh_user: Some("ubuntu".to_string()),
            ..Default::default()
        }];

        let merged = merge_inventory(local, Vec::new());
        assert_eq!(merged.len(), 1);
        assert!(merged[0].uuid.is_none());
    }
}

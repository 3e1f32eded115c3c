//! Authenticated-client cache actor

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::{CacheError, CacheRequest, CACHE_REQUEST_CAPACITY, INVALIDATE_KEY};
use crate::api::{ControlPlaneApi, ControllerSession};
use tether_core::config::ConfigStore;

/// Handle to the client cache worker.
///
/// A cache miss authenticates against the namespace's configured endpoint;
/// a hit transparently refreshes the session with the stored refresh token
/// and persists the rotated pair before answering. Both paths run on the
/// single worker, so N concurrent callers for one uncached namespace cost
/// exactly one login.
#[derive(Clone)]
pub struct ClientCache {
    tx: mpsc::Sender<CacheRequest<Arc<ControllerSession>>>,
}

impl ClientCache {
    /// Spawn the worker task and return a handle to it.
    pub fn spawn(api: Arc<dyn ControlPlaneApi>, store: Arc<ConfigStore>) -> Self {
        let (tx, rx) = mpsc::channel(CACHE_REQUEST_CAPACITY);
        tokio::spawn(run_worker(api, store, rx));
        Self { tx }
    }

    /// Get the authenticated session for a namespace.
    pub async fn session(&self, namespace: &str) -> Result<Arc<ControllerSession>, CacheError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(CacheRequest {
                namespace: namespace.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| CacheError::WorkerGone)?;

        // A lookup reply always carries a session; None only answers
        // invalidation requests.
        reply_rx
            .await
            .map_err(|_| CacheError::WorkerGone)??
            .ok_or(CacheError::WorkerGone)
    }

    /// Drop every cached session.
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
    store: Arc<ConfigStore>,
    mut rx: mpsc::Receiver<CacheRequest<Arc<ControllerSession>>>,
) {
    let mut sessions: HashMap<String, Arc<ControllerSession>> = HashMap::new();

    while let Some(request) = rx.recv().await {
        if request.namespace == INVALIDATE_KEY {
            tracing::debug!(cached = sessions.len(), "Clearing client cache");
            sessions.clear();
            let _ = request.reply.send(Ok(None));
            continue;
        }

        let result = resolve(&*api, &store, &mut sessions, &request.namespace).await;
        if let Err(err) = &result {
            tracing::debug!(namespace = %request.namespace, error = %err, "Client cache lookup failed");
        }
        let _ = request.reply.send(result.map(Some));
    }
}

async fn resolve(
    api: &dyn ControlPlaneApi,
    store: &ConfigStore,
    sessions: &mut HashMap<String, Arc<ControllerSession>>,
    namespace: &str,
) -> Result<Arc<ControllerSession>, CacheError> {
    if let Some(session) = sessions.get(namespace) {
        let tokens = api.refresh(session.base_url(), &session.refresh_token()).await?;
        store.update_tokens(namespace, &tokens.access_token, &tokens.refresh_token)?;
        session.rotate(tokens);
        return Ok(Arc::clone(session));
    }

    let config = store.namespace(namespace)?;
    let tokens = api
        .login(
            &config.controller.endpoint,
            &config.controller.email,
            &config.controller.password,
        )
        .await?;
    store.update_tokens(namespace, &tokens.access_token, &tokens.refresh_token)?;

    tracing::debug!(namespace = %namespace, "Authenticated new controller session");
    let session = Arc::new(ControllerSession::new(config.controller.endpoint, tokens));
    sessions.insert(namespace.to_string(), Arc::clone(&session));
    Ok(session)
}

//! Resource cache actors
//!
//! Each cache is one background worker owning its map exclusively and
//! draining a request channel in arrival order. That gives two guarantees
//! without any shared-map locking: at most one recomputation per namespace
//! is ever in flight, and concurrent callers for the same namespace all
//! receive the value computed by the first request.
//!
//! The invalidation contract is shared by all caches: a request carrying
//! the empty-string key clears the whole map.

mod agent_cache;
mod client_cache;
mod sync;

pub use agent_cache::AgentCache;
pub use client_cache::ClientCache;
pub use sync::InventorySync;

use thiserror::Error;
use tokio::sync::oneshot;

use crate::error::ApiError;
use tether_core::error::ConfigError;

/// Capacity of each cache's request channel.
///
/// Requests queue here while the worker is authenticating or listing
/// inventory; 64 covers bursts from parallel executors without letting an
/// unbounded backlog build up behind a dead controller.
pub(crate) const CACHE_REQUEST_CAPACITY: usize = 64;

/// Errors surfaced by cache lookups
#[derive(Error, Debug)]
pub enum CacheError {
    /// Controller call failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Namespace store failed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The cache worker task has exited
    #[error("Cache worker is no longer running")]
    WorkerGone,
}

/// One queued cache request.
///
/// Lookups answer `Some(value)`; an invalidation (empty-string namespace)
/// answers `None` after clearing the map.
pub(crate) struct CacheRequest<T> {
    pub namespace: String,
    pub reply: oneshot::Sender<Result<Option<T>, CacheError>>,
}

/// Key that clears the entire cache map.
pub(crate) const INVALIDATE_KEY: &str = "";

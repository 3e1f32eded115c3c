//! tether-client: Control-plane client and resource caches
//!
//! This crate owns everything needed to turn a namespace name into an
//! authenticated controller session: the REST client for login, token
//! refresh and inventory listing, and the cache actors that serialize
//! concurrent access to those sessions.

pub mod api;
pub mod cache;
pub mod error;
pub mod rest;

pub use api::{AgentSummary, ControlPlaneApi, ControllerSession, MicroserviceSummary, SessionTokens};
pub use cache::{AgentCache, CacheError, ClientCache, InventorySync};
pub use error::ApiError;
pub use rest::RestClient;

//! Control-plane API abstraction
//!
//! The cache actors and executors talk to the controller through the
//! [`ControlPlaneApi`] trait so they can be exercised against counting
//! fakes in tests; [`crate::rest::RestClient`] is the production
//! implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Mutex;

use crate::error::ApiError;

/// Token pair issued by a login or refresh call
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionTokens {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// An authenticated controller session.
///
/// Token rotation happens behind a mutex so a cached `Arc<ControllerSession>`
/// keeps its identity across refreshes; callers holding the handle always
/// read the latest tokens.
#[derive(Debug)]
pub struct ControllerSession {
    endpoint: String,
    tokens: Mutex<SessionTokens>,
}

impl ControllerSession {
    pub fn new(endpoint: impl Into<String>, tokens: SessionTokens) -> Self {
        Self {
            endpoint: endpoint.into(),
            tokens: Mutex::new(tokens),
        }
    }

    /// Controller API base URL
    pub fn base_url(&self) -> &str {
        &self.endpoint
    }

    /// Current bearer token
    pub fn access_token(&self) -> String {
        self.tokens
            .lock()
            .expect("session token lock poisoned")
            .access_token
            .clone()
    }

    /// Current refresh token
    pub fn refresh_token(&self) -> String {
        self.tokens
            .lock()
            .expect("session token lock poisoned")
            .refresh_token
            .clone()
    }

    /// Swap in a rotated token pair
    pub fn rotate(&self, tokens: SessionTokens) {
        *self.tokens.lock().expect("session token lock poisoned") = tokens;
    }
}

/// One agent as reported by the controller
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSummary {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(rename = "daemonStatus", default)]
    pub daemon_status: Option<String>,
}

/// One microservice as reported by the controller
#[derive(Debug, Clone, Deserialize)]
pub struct MicroserviceSummary {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Operations the rest of the system needs from the controller
#[async_trait]
pub trait ControlPlaneApi: Send + Sync {
    /// Authenticate with stored credentials and obtain a token pair
    async fn login(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<SessionTokens, ApiError>;

    /// Exchange a refresh token for a rotated token pair
    async fn refresh(&self, endpoint: &str, refresh_token: &str)
        -> Result<SessionTokens, ApiError>;

    /// List the backend agent inventory
    async fn list_agents(&self, session: &ControllerSession) -> Result<Vec<AgentSummary>, ApiError>;

    /// Resolve a microservice by name
    async fn lookup_microservice(
        &self,
        session: &ControllerSession,
        name: &str,
    ) -> Result<MicroserviceSummary, ApiError>;
}

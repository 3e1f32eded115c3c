//! Controller REST client
//!
//! Certificate validation is relaxed to tolerate self-signed controller
//! certificates; the same trade-off the session transport makes. Requests
//! carry the session's bearer token in an Authorization header.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::api::{
    AgentSummary, ControlPlaneApi, ControllerSession, MicroserviceSummary, SessionTokens,
};
use crate::error::ApiError;

/// Per-request timeout for controller REST calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Production control-plane client
pub struct RestClient {
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct AgentListResponse {
    #[serde(default)]
    fogs: Vec<AgentSummary>,
}

#[derive(Deserialize)]
struct MicroserviceListResponse {
    #[serde(default)]
    microservices: Vec<MicroserviceSummary>,
}

impl RestClient {
    /// Build a client that accepts self-signed controller certificates.
    pub fn new() -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }

    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ControlPlaneApi for RestClient {
    async fn login(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<SessionTokens, ApiError> {
        tracing::debug!(endpoint = %endpoint, email = %email, "Logging in to controller");

        let response = self
            .http
            .post(format!("{}/user/login", endpoint.trim_end_matches('/')))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let tokens = Self::expect_success(response).await?.json().await?;
        Ok(tokens)
    }

    async fn refresh(
        &self,
        endpoint: &str,
        refresh_token: &str,
    ) -> Result<SessionTokens, ApiError> {
        tracing::trace!(endpoint = %endpoint, "Refreshing controller session");

        let response = self
            .http
            .post(format!("{}/user/refresh", endpoint.trim_end_matches('/')))
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await?;

        let tokens = Self::expect_success(response).await?.json().await?;
        Ok(tokens)
    }

    async fn list_agents(&self, session: &ControllerSession) -> Result<Vec<AgentSummary>, ApiError> {
        let response = self
            .http
            .get(format!(
                "{}/iofog/list",
                session.base_url().trim_end_matches('/')
            ))
            .bearer_auth(session.access_token())
            .send()
            .await?;

        let list: AgentListResponse = Self::expect_success(response).await?.json().await?;
        Ok(list.fogs)
    }

    async fn lookup_microservice(
        &self,
        session: &ControllerSession,
        name: &str,
    ) -> Result<MicroserviceSummary, ApiError> {
        let response = self
            .http
            .get(format!(
                "{}/microservices",
                session.base_url().trim_end_matches('/')
            ))
            .query(&[("name", name)])
            .bearer_auth(session.access_token())
            .send()
            .await?;

        let list: MicroserviceListResponse = Self::expect_success(response).await?.json().await?;
        list.microservices
            .into_iter()
            .find(|ms| ms.name == name)
            .ok_or_else(|| ApiError::NotFound {
                kind: "Microservice",
                name: name.to_string(),
            })
    }
}

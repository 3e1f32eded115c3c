//! Control-plane API error types

use thiserror::Error;

/// Errors returned by the controller's REST API
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request could not be performed
    #[error("Controller request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Controller answered with a non-success status
    #[error("Controller returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Named resource does not exist on the controller
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// Malformed controller endpoint
    #[error("Invalid controller endpoint: {0}")]
    Endpoint(String),
}

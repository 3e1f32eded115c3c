//! Namespace configuration structures

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// On-disk layout of the namespace file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamespaceFile {
    /// Namespaces keyed by name
    #[serde(default)]
    pub namespaces: HashMap<String, Namespace>,
}

/// One namespace: a controller plus the agents provisioned under it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Namespace {
    /// Namespace name
    pub name: String,

    /// Controller this namespace talks to
    pub controller: ControllerProfile,

    /// Locally known agents
    #[serde(default)]
    pub agents: Vec<AgentRecord>,
}

/// Controller endpoint and credentials for a namespace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerProfile {
    /// Controller API base URL, e.g. `http://controller:51121/api/v3`
    pub endpoint: String,

    /// Login email
    pub email: String,

    /// Login password
    pub password: String,

    /// Last issued access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Last issued refresh token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// One agent as known locally.
///
/// `uuid` and `host` are backend-authoritative and filled in by inventory
/// sync; the provisioning fields are only known locally and survive sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Agent name
    pub name: String,

    /// Backend identity, set once the agent has registered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    /// Backend-reported address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// SSH user used during provisioning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_user: Option<String>,

    /// SSH port used during provisioning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_port: Option<u16>,

    /// Private key used during provisioning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<PathBuf>,

    /// Local provisioning timestamp, milliseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at_ms: Option<u64>,
}

impl Namespace {
    /// Look up a locally known agent by name
    pub fn agent(&self, name: &str) -> Option<&AgentRecord> {
        self.agents.iter().find(|a| a.name == name)
    }
}

//! Session URL building
//!
//! Session endpoints reuse the controller's REST base URL with the scheme
//! rewritten to ws(s). Resource paths are appended to whatever path the
//! base already carries, so a base of `http://controller/api/v3` yields
//! `ws://controller/api/v3/iofog/{id}/logs`.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use url::Url;

/// Lower bound for the `tail` query parameter
pub const TAIL_MIN: u32 = 1;
/// Upper bound for the `tail` query parameter
pub const TAIL_MAX: u32 = 10_000;
/// Default number of historical lines requested
pub const TAIL_DEFAULT: u32 = 100;

/// What kind of resource a log stream is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Agent,
    Microservice,
    SystemMicroservice,
}

impl LogTarget {
    fn path(&self, uuid: &str) -> String {
        match self {
            Self::Agent => format!("iofog/{}/logs", uuid),
            Self::Microservice => format!("microservices/{}/logs", uuid),
            Self::SystemMicroservice => format!("microservices/system/{}/logs", uuid),
        }
    }
}

/// Log stream query parameters
#[derive(Debug, Clone)]
pub struct LogQuery {
    /// Historical lines to request, clamped to `TAIL_MIN..=TAIL_MAX`
    pub tail: u32,
    /// Keep streaming after the historical lines
    pub follow: bool,
    /// Only logs at or after this instant
    pub since: Option<DateTime<Utc>>,
    /// Only logs before this instant
    pub until: Option<DateTime<Utc>>,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            tail: TAIL_DEFAULT,
            follow: true,
            since: None,
            until: None,
        }
    }
}

impl LogQuery {
    fn apply(&self, url: &mut Url) {
        let tail = self.tail.clamp(TAIL_MIN, TAIL_MAX);
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("tail", &tail.to_string());
        pairs.append_pair("follow", if self.follow { "true" } else { "false" });
        if let Some(since) = &self.since {
            pairs.append_pair("since", &since.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        if let Some(until) = &self.until {
            pairs.append_pair("until", &until.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
    }
}

/// Parse an RFC3339 timestamp from the command line.
pub fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Not an RFC3339 timestamp: {}", value))
}

/// Rewrite the controller base URL onto the WebSocket scheme.
fn websocket_base(endpoint: &str) -> Result<Url> {
    let mut url = Url::parse(endpoint)
        .with_context(|| format!("Invalid controller endpoint: {}", endpoint))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(anyhow!("Unsupported endpoint scheme: {}", other)),
    };
    url.set_scheme(scheme)
        .map_err(|_| anyhow!("Cannot rewrite scheme for {}", endpoint))?;
    Ok(url)
}

fn with_resource_path(mut url: Url, resource: &str) -> Url {
    let path = format!("{}/{}", url.path().trim_end_matches('/'), resource);
    url.set_path(&path);
    url
}

/// URL for an interactive exec session against a microservice.
pub fn exec_url(endpoint: &str, target_uuid: &str) -> Result<Url> {
    let base = websocket_base(endpoint)?;
    Ok(with_resource_path(
        base,
        &format!("microservices/exec/{}", target_uuid),
    ))
}

/// URL for a log stream against an agent or microservice.
pub fn logs_url(
    endpoint: &str,
    target: LogTarget,
    target_uuid: &str,
    query: &LogQuery,
) -> Result<Url> {
    let base = websocket_base(endpoint)?;
    let mut url = with_resource_path(base, &target.path(target_uuid));
    query.apply(&mut url);
    Ok(url)
}

//! Session failure classification
//!
//! Pure, total mapping from session errors to the single sentence shown
//! to the operator. Raw transport text is never surfaced when a
//! classification exists; truly unrecognized errors pass through with
//! their original text rather than being swallowed.

use crate::error::SessionError;

const CONNECT_FAILURE_MESSAGE: &str =
    "Unable to connect to the controller. Verify the endpoint address and that the controller is running.";

const ABNORMAL_CLOSURE_MESSAGE: &str =
    "The connection to the controller was lost unexpectedly. Check the network path and try again.";

const MESSAGE_TOO_LARGE_MESSAGE: &str =
    "The session was closed because a message exceeded the controller's size limit.";

const SERVER_ERROR_MESSAGE: &str =
    "The controller reported an internal error. Check the controller logs for details.";

const POLICY_FALLBACK_MESSAGE: &str = "Policy violation: Access denied";

/// Known policy-violation phrases and the fixed sentence for each.
///
/// Matching is case-insensitive substring containment against the
/// extracted reason.
const POLICY_TABLE: &[(&str, &str)] = &[
    (
        "no available session",
        "No exec session is available for this microservice. Enable exec on it and try again.",
    ),
    (
        "already active exec session",
        "Another exec session is already attached to this target. Detach it before connecting again.",
    ),
    (
        "agent is not running",
        "The agent is not running. Start it and try again.",
    ),
    (
        "microservice is not running",
        "The microservice is not running. Start it and try again.",
    ),
    (
        "timeout waiting for agent",
        "The agent did not respond in time. Check that it is connected to the controller.",
    ),
    (
        "insufficient permission",
        "You do not have permission to open a session on this target.",
    ),
    (
        "authentication failed",
        "Authentication failed. Log in to the namespace again and retry.",
    ),
    (
        "privileged",
        "This operation is restricted to privileged controller users.",
    ),
];

/// Classify a session error into a user-facing message.
///
/// `None` classifies to the empty string. Unrecognized errors pass
/// through with their original text.
pub fn classify(error: Option<&SessionError>) -> String {
    let Some(error) = error else {
        return String::new();
    };

    match error {
        SessionError::RemoteClosure { code: 1008, reason } => classify_policy(reason),
        SessionError::RemoteClosure { code: 1006, .. } => ABNORMAL_CLOSURE_MESSAGE.to_string(),
        SessionError::RemoteClosure { code: 1009, .. } => MESSAGE_TOO_LARGE_MESSAGE.to_string(),
        SessionError::RemoteClosure { code: 1011, .. } => SERVER_ERROR_MESSAGE.to_string(),
        SessionError::ConnectFailure { .. } | SessionError::HandshakeStatus { .. } => {
            CONNECT_FAILURE_MESSAGE.to_string()
        }
        other => other.to_string(),
    }
}

/// Map a 1008 reason onto its fixed sentence.
fn classify_policy(reason: &str) -> String {
    let candidate = extract_reason(reason).unwrap_or_else(|| reason.trim().to_string());
    let lowered = candidate.to_ascii_lowercase();

    for (phrase, sentence) in POLICY_TABLE {
        if lowered.contains(phrase) {
            return (*sentence).to_string();
        }
    }
    POLICY_FALLBACK_MESSAGE.to_string()
}

/// Pull an embedded reason out of server close text.
///
/// There is no single authoritative server format, so the fallback chain
/// runs in a fixed order and the order is load-bearing: a labeled
/// `reason:` field, then a labeled `policy violation:` field, then the
/// last quoted substring, then the colon-suffix after `close 1008`.
/// Reordering changes which message surfaces for ambiguous server text.
fn extract_reason(text: &str) -> Option<String> {
    labeled_value(text, "reason")
        .or_else(|| labeled_value(text, "policy violation"))
        .or_else(|| last_quoted(text))
        .or_else(|| close_code_suffix(text))
}

/// Value of a `label: value` or `"label": "value"` field.
fn labeled_value(text: &str, label: &str) -> Option<String> {
    let start = text.to_ascii_lowercase().find(label)? + label.len();
    let tail = text[start..].trim_start_matches(['"', ' ']);
    let tail = tail.strip_prefix(':')?;
    let tail = tail.trim_start().trim_start_matches('"');
    let end = tail
        .find(['"', '}', ',', '\n'])
        .unwrap_or(tail.len());
    let value = tail[..end].trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Contents of the last double-quoted substring.
fn last_quoted(text: &str) -> Option<String> {
    let quotes: Vec<usize> = text.match_indices('"').map(|(i, _)| i).collect();
    if quotes.len() < 2 {
        return None;
    }
    let open = quotes[quotes.len() - 2];
    let close = quotes[quotes.len() - 1];
    let inner = text[open + 1..close].trim();
    (!inner.is_empty()).then(|| inner.to_string())
}

/// Suffix after a `close 1008:` marker.
fn close_code_suffix(text: &str) -> Option<String> {
    let marker = "close 1008";
    let start = text.to_ascii_lowercase().find(marker)? + marker.len();
    let tail = text[start..].trim_start();
    let tail = tail.strip_prefix(':')?.trim();
    (!tail.is_empty()).then(|| tail.to_string())
}

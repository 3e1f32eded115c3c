//! Session bookkeeping
//!
//! Tracks live exec and log sessions by correlation id so an external
//! sweep can expire idle ones. The expiry cadence is owned by the caller;
//! the registry only answers which entries fell behind the cutoff.

use std::time::Duration;

use dashmap::DashMap;

use tether_core::time::current_time_millis;

/// One tracked session
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    /// Session correlation id
    pub session_id: String,
    /// Microservice or agent the session is bound to
    pub target_id: String,
    /// Last activity, milliseconds since the Unix epoch
    pub last_activity_ms: u64,
}

/// Registry of live sessions, keyed by session id
#[derive(Debug, Default)]
pub struct SessionRegistry {
    entries: DashMap<String, RegistryEntry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a session, stamping its activity to now.
    pub fn register(&self, session_id: impl Into<String>, target_id: impl Into<String>) {
        let session_id = session_id.into();
        self.entries.insert(
            session_id.clone(),
            RegistryEntry {
                session_id,
                target_id: target_id.into(),
                last_activity_ms: current_time_millis(),
            },
        );
    }

    /// Refresh a session's activity timestamp. Returns false for unknown
    /// sessions.
    pub fn touch(&self, session_id: &str) -> bool {
        match self.entries.get_mut(session_id) {
            Some(mut entry) => {
                entry.last_activity_ms = current_time_millis();
                true
            }
            None => false,
        }
    }

    /// Stop tracking a session.
    pub fn remove(&self, session_id: &str) -> Option<RegistryEntry> {
        self.entries.remove(session_id).map(|(_, entry)| entry)
    }

    /// Snapshot of one entry
    pub fn get(&self, session_id: &str) -> Option<RegistryEntry> {
        self.entries.get(session_id).map(|entry| entry.clone())
    }

    /// Number of tracked sessions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return every session idle for longer than `max_idle`.
    pub fn expire_idle(&self, max_idle: Duration) -> Vec<RegistryEntry> {
        let cutoff = current_time_millis().saturating_sub(max_idle.as_millis() as u64);

        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.last_activity_ms < cutoff)
            .map(|entry| entry.key().clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|session_id| self.remove(&session_id))
            .collect()
    }
}

//! Stored value plus its expiry.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// One map entry: the JSON object text and when it stops being readable.
///
/// Fields are private and there are no setters. To change a record, replace
/// the map entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    payload: String,
    #[serde(default)]
    expires_at: Option<u64>,
}

impl Record {
    /// Build a record that expires `ttl_seconds` from now. Negative TTL means
    /// it never expires.
    pub fn new(payload: impl Into<String>, ttl_seconds: i64) -> Self {
        Self::with_clock(payload, ttl_seconds, now_millis())
    }

    /// Build a record that never expires.
    pub fn persistent(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            expires_at: None,
        }
    }

    fn with_clock(payload: impl Into<String>, ttl_seconds: i64, now: u64) -> Self {
        let expires_at = u64::try_from(ttl_seconds)
            .ok()
            .map(|ttl| now.saturating_add(ttl.saturating_mul(1000)));
        Self {
            payload: payload.into(),
            expires_at,
        }
    }

    /// The JSON object text as it was stored.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Absolute expiry in ms since the Unix epoch, or `None`.
    pub fn expires_at(&self) -> Option<u64> {
        self.expires_at
    }

    /// `true` once `now_ms` reaches the expiry instant.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        self.expires_at.is_some_and(|at| now_ms >= at)
    }
}

/// Current wall-clock time in ms since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};

/// Server-authoritative timer state as pushed on the broadcast channel.
///
/// While running, the true remaining time is
/// `duration_seconds - elapsed_since(started_at)`, clamped at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub is_running: bool,
    pub duration_seconds: i64,
    pub remaining_seconds: i64,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub started_at: Option<DateTime<Utc>>,
    /// Countdown restart marker. Servers that send it make threshold resets
    /// explicit instead of inferred from a full-duration snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<u64>,
}

impl TimerSnapshot {
    pub fn stopped(duration_seconds: i64, remaining_seconds: i64) -> Self {
        Self {
            is_running: false,
            duration_seconds,
            remaining_seconds,
            started_at: None,
            epoch: None,
        }
    }

    pub fn running(duration_seconds: i64, started_at: DateTime<Utc>) -> Self {
        Self {
            is_running: true,
            duration_seconds,
            remaining_seconds: duration_seconds,
            started_at: Some(started_at),
            epoch: None,
        }
    }

    pub fn with_epoch(mut self, epoch: u64) -> Self {
        self.epoch = Some(epoch);
        self
    }

    /// The countdown sits at its full configured length.
    pub fn is_full_duration(&self) -> bool {
        self.remaining_seconds == self.duration_seconds
    }
}

/// An unparseable timestamp is treated like a missing one.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(|s| {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }))
}

/// The part of a whole-application state message this crate consumes.
///
/// Table lists, problem files and the rest of the portal state are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StateMessage {
    pub timer: TimerSnapshot,
    #[serde(default)]
    pub lomba_title: Option<String>,
}

/// Parse a broadcast message, or `None` if it is malformed or has no
/// usable `timer` field.
pub fn parse_state_message(text: &str) -> Option<StateMessage> {
    match serde_json::from_str::<StateMessage>(text) {
        Ok(message) => Some(message),
        Err(e) => {
            debug!("Ignoring state message: {}", e);
            None
        }
    }
}

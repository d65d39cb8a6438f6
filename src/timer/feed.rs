//! Sources of state messages for the countdown.
//!
//! Either JSON lines (one whole-application state per line, e.g. piped
//! from a WebSocket client) or periodic polling of the portal's state
//! endpoint. Malformed messages are skipped; every good one is published,
//! even when identical to the last, so the countdown re-anchors.

use anyhow::Result;
use log::{debug, warn};
use reqwest::Client;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use super::snapshot::{StateMessage, TimerSnapshot, parse_state_message};
use crate::io::HttpOptions;

pub type SnapshotSender = watch::Sender<Option<TimerSnapshot>>;

fn publish(tx: &SnapshotSender, message: StateMessage) {
    tx.send_replace(Some(message.timer));
}

/// Publish every well-formed line from `reader` until EOF.
///
/// Returns how many messages were applied.
pub async fn pump_lines<R>(reader: R, tx: &SnapshotSender) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut applied = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(message) = parse_state_message(line) {
            publish(tx, message);
            applied += 1;
        }
        if tx.is_closed() {
            debug!("No countdown listening, stopping line feed");
            break;
        }
    }

    Ok(applied)
}

/// Polls a state endpoint such as `GET /api/state`.
pub struct PollFeed {
    client: Client,
    url: String,
    interval: Duration,
}

impl PollFeed {
    pub fn new(url: String, interval: Duration, http: &HttpOptions) -> Result<Self> {
        let client = Client::builder().timeout(http.timeout).build()?;
        Ok(Self {
            client,
            url,
            interval,
        })
    }

    /// Fetch one message. `Ok(None)` when the body is not a usable state.
    pub async fn fetch_once(&self) -> Result<Option<StateMessage>> {
        let resp = self.client.get(&self.url).send().await?.error_for_status()?;
        let body = resp.text().await?;
        Ok(parse_state_message(&body))
    }

    /// Poll until every receiver is gone. Failed polls are logged and
    /// retried on the next interval.
    pub async fn run(self, tx: SnapshotSender) {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !tx.is_closed() {
            interval.tick().await;
            match self.fetch_once().await {
                Ok(Some(message)) => publish(&tx, message),
                Ok(None) => debug!("State from {} had no usable timer", self.url),
                Err(e) => warn!("Polling {} failed: {}", self.url, e),
            }
        }
    }
}

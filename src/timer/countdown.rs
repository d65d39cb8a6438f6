//! Local projection of the server timer.
//!
//! The server pushes a [`TimerSnapshot`] only when the timer changes, so the
//! displayed value is extrapolated from the latest snapshot on every tick.
//! Each snapshot replaces the extrapolation base outright; nothing carries
//! over from the previous one except which alerts already fired.

use chrono::{DateTime, Utc};

use super::alerts::ThresholdAlerts;
use super::snapshot::TimerSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stopped,
    Running,
    Expired,
}

/// One evaluation of the countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub remaining_seconds: i64,
    pub phase: Phase,
    /// Threshold that fired on this frame, if any.
    pub alert: Option<i64>,
}

struct Anchor {
    snapshot: TimerSnapshot,
    start: DateTime<Utc>,
    /// Lowest value displayed since this anchor was set.
    floor: Option<i64>,
}

impl Anchor {
    fn remaining_at(&self, now: DateTime<Utc>) -> i64 {
        if !self.snapshot.is_running {
            return self.snapshot.remaining_seconds.max(0);
        }
        let elapsed = (now - self.start).num_milliseconds().div_euclid(1000).max(0);
        let computed = self.snapshot.duration_seconds.saturating_sub(elapsed).max(0);
        // A clock stepping backwards must not raise the display.
        match self.floor {
            Some(floor) => computed.min(floor),
            None => computed,
        }
    }
}

/// Reconciles server snapshots with a local clock.
pub struct Countdown {
    anchor: Option<Anchor>,
    alerts: ThresholdAlerts,
    last_display: Option<i64>,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(ThresholdAlerts::default())
    }
}

impl Countdown {
    pub fn new(alerts: ThresholdAlerts) -> Self {
        Self {
            anchor: None,
            alerts,
            last_display: None,
        }
    }

    pub fn snapshot(&self) -> Option<&TimerSnapshot> {
        self.anchor.as_ref().map(|a| &a.snapshot)
    }

    pub fn alerts(&self) -> &ThresholdAlerts {
        &self.alerts
    }

    /// Re-anchor on `snapshot`, received at `now`, and evaluate at once.
    ///
    /// A running snapshot without `started_at` counts from its arrival.
    pub fn apply(&mut self, snapshot: TimerSnapshot, now: DateTime<Utc>) -> Frame {
        self.alerts.observe(&snapshot);
        let start = snapshot.started_at.unwrap_or(now);
        self.anchor = Some(Anchor {
            snapshot,
            start,
            floor: None,
        });
        self.evaluate(now, true)
    }

    /// Evaluate at `now`. `None` until the first snapshot arrives.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Frame> {
        self.anchor.as_ref()?;
        Some(self.evaluate(now, false))
    }

    /// Displayed value at `now` without recording it.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Option<i64> {
        self.anchor.as_ref().map(|a| a.remaining_at(now))
    }

    fn evaluate(&mut self, now: DateTime<Utc>, reanchored: bool) -> Frame {
        let Some(anchor) = self.anchor.as_mut() else {
            return Frame {
                remaining_seconds: 0,
                phase: Phase::Stopped,
                alert: None,
            };
        };

        let remaining = anchor.remaining_at(now);
        anchor.floor = Some(remaining);
        let running = anchor.snapshot.is_running;

        let phase = match (running, remaining) {
            (false, _) => Phase::Stopped,
            (true, 0) => Phase::Expired,
            (true, _) => Phase::Running,
        };

        let alert = match (running, reanchored) {
            (false, _) => None,
            (true, true) => self.alerts.step_reanchored(self.last_display, remaining),
            (true, false) => self.alerts.step(self.last_display, remaining),
        };
        self.last_display = Some(remaining);

        Frame {
            remaining_seconds: remaining,
            phase,
            alert,
        }
    }
}

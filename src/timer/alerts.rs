use log::debug;
use std::collections::{BTreeSet, HashSet};

use super::snapshot::TimerSnapshot;

/// Remaining-second values that raise an alert by default.
pub const DEFAULT_THRESHOLDS: [i64; 14] = [300, 60, 30, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0];

/// One-shot alerts tied to the displayed countdown value.
///
/// While counting down locally a threshold fires when the display lands on
/// it from above, even if a late tick skipped the second before it. A
/// re-anchor fires only on an exact one-second step. Each threshold fires
/// at most once per countdown cycle.
#[derive(Debug, Clone)]
pub struct ThresholdAlerts {
    thresholds: BTreeSet<i64>,
    fired: HashSet<i64>,
    epoch: Option<u64>,
}

impl Default for ThresholdAlerts {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLDS)
    }
}

impl ThresholdAlerts {
    pub fn new(thresholds: impl IntoIterator<Item = i64>) -> Self {
        Self {
            thresholds: thresholds.into_iter().filter(|t| *t >= 0).collect(),
            fired: HashSet::new(),
            epoch: None,
        }
    }

    pub fn thresholds(&self) -> impl Iterator<Item = i64> + '_ {
        self.thresholds.iter().rev().copied()
    }

    pub fn has_fired(&self, threshold: i64) -> bool {
        self.fired.contains(&threshold)
    }

    /// Start a new cycle if `snapshot` marks a restarted countdown.
    ///
    /// With an epoch the marker is a changed epoch; without one it is a
    /// snapshot whose remaining time equals its duration. Returns whether
    /// the fired set was cleared.
    pub fn observe(&mut self, snapshot: &TimerSnapshot) -> bool {
        let restarted = match snapshot.epoch {
            Some(epoch) => self.epoch.replace(epoch) != Some(epoch),
            None => snapshot.is_full_duration(),
        };
        if restarted && !self.fired.is_empty() {
            debug!("Countdown restarted, clearing {} fired alerts", self.fired.len());
        }
        if restarted {
            self.fired.clear();
        }
        restarted
    }

    /// Evaluate a local decrement from `previous` to `current`.
    pub fn step(&mut self, previous: Option<i64>, current: i64) -> Option<i64> {
        let previous = previous?;
        if previous <= current || !self.thresholds.contains(&current) {
            return None;
        }
        self.fired.insert(current).then_some(current)
    }

    /// Evaluate a display change caused by a new snapshot.
    pub fn step_reanchored(&mut self, previous: Option<i64>, current: i64) -> Option<i64> {
        if previous?.checked_sub(1) != Some(current) {
            return None;
        }
        self.step(previous, current)
    }
}

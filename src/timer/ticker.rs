use chrono::{DateTime, Utc};
use log::{debug, trace};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use super::countdown::{Countdown, Frame};
use super::snapshot::TimerSnapshot;

/// Wall clock used to extrapolate the countdown.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Handle to a running ticker. Dropping it stops the task.
pub struct TickerHandle {
    task: JoinHandle<()>,
}

impl TickerHandle {
    /// Stop the recurring evaluation.
    pub fn cancel(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the ticker to end on its own (the snapshot sender closed).
    pub async fn join(mut self) {
        let _ = (&mut self.task).await;
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Recurring countdown evaluation on a tokio task.
pub struct Ticker;

impl Ticker {
    /// Evaluate `countdown` every `cadence` and on every snapshot published
    /// to `snapshots`, passing each frame to `on_frame`.
    ///
    /// Must be called inside a tokio runtime. The task ends when the
    /// handle is cancelled or dropped, or when the sender is dropped.
    pub fn spawn<C, F>(
        mut snapshots: watch::Receiver<Option<TimerSnapshot>>,
        cadence: Duration,
        mut countdown: Countdown,
        clock: C,
        mut on_frame: F,
    ) -> TickerHandle
    where
        C: Clock,
        F: FnMut(&Frame) + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut interval = time::interval(cadence);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let initial = snapshots.borrow_and_update().clone();
            if let Some(snapshot) = initial {
                on_frame(&countdown.apply(snapshot, clock.now()));
            }

            loop {
                tokio::select! {
                    changed = snapshots.changed() => {
                        if changed.is_err() {
                            debug!("Snapshot source closed, stopping ticker");
                            break;
                        }
                        let latest = snapshots.borrow_and_update().clone();
                        if let Some(snapshot) = latest {
                            trace!("Re-anchoring on {:?}", snapshot);
                            on_frame(&countdown.apply(snapshot, clock.now()));
                        }
                    }
                    _ = interval.tick() => {
                        if let Some(frame) = countdown.tick(clock.now()) {
                            on_frame(&frame);
                        }
                    }
                }
            }
        });

        TickerHandle { task }
    }
}

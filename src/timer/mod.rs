//! Countdown reconciliation against server-pushed timer snapshots.
//!
//! - [`snapshot`]: wire types and state message parsing
//! - [`countdown`]: extrapolation from the latest snapshot
//! - [`alerts`]: one-shot threshold notifications
//! - [`ticker`]: cancellable recurring evaluation on a tokio task
//! - [`feed`]: stdin and polling sources of state messages

pub mod alerts;
pub mod countdown;
pub mod feed;
pub mod snapshot;
pub mod ticker;

pub use alerts::{DEFAULT_THRESHOLDS, ThresholdAlerts};
pub use countdown::{Countdown, Frame, Phase};
pub use snapshot::{StateMessage, TimerSnapshot, parse_state_message};
pub use ticker::{Clock, SystemClock, Ticker, TickerHandle};

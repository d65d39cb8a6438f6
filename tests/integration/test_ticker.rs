//! Integration tests: the recurring countdown task on a paused tokio clock

use chrono::{DateTime, TimeZone, Utc};
use contest_preview::timer::{Clock, Countdown, Frame, Phase, Ticker, TimerSnapshot};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant};

/// Wall clock that follows tokio's (paused) time.
#[derive(Clone)]
struct TokioClock {
    base: DateTime<Utc>,
    origin: Instant,
}

impl TokioClock {
    fn new(base: DateTime<Utc>) -> Self {
        Self {
            base,
            origin: Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = Instant::now() - self.origin;
        self.base + chrono::Duration::milliseconds(elapsed.as_millis() as i64)
    }
}

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

fn recorder() -> (Arc<Mutex<Vec<Frame>>>, impl FnMut(&Frame) + Send + 'static) {
    let frames = Arc::new(Mutex::new(Vec::new()));
    let sink = frames.clone();
    (frames, move |frame: &Frame| sink.lock().unwrap().push(frame.clone()))
}

#[tokio::test(start_paused = true)]
async fn test_counts_down_and_alerts() {
    let (tx, rx) = watch::channel(None);
    let (frames, on_frame) = recorder();
    let _handle = Ticker::spawn(
        rx,
        Duration::from_millis(250),
        Countdown::default(),
        TokioClock::new(base()),
        on_frame,
    );

    tx.send(Some(TimerSnapshot::running(5, base()))).unwrap();
    time::sleep(Duration::from_secs(7)).await;

    let frames = frames.lock().unwrap();
    let values: Vec<i64> = frames.iter().map(|f| f.remaining_seconds).collect();
    assert_eq!(values.first(), Some(&5));
    assert!(values.windows(2).all(|w| w[0] >= w[1]), "{:?}", values);

    let last = frames.last().unwrap();
    assert_eq!(last.remaining_seconds, 0);
    assert_eq!(last.phase, Phase::Expired);

    let alerts: Vec<i64> = frames.iter().filter_map(|f| f.alert).collect();
    assert_eq!(alerts, vec![4, 3, 2, 1, 0]);
}

#[tokio::test(start_paused = true)]
async fn test_reanchors_on_new_snapshot() {
    let (tx, rx) = watch::channel(Some(TimerSnapshot::running(100, base())));
    let (frames, on_frame) = recorder();
    let _handle = Ticker::spawn(
        rx,
        Duration::from_millis(250),
        Countdown::default(),
        TokioClock::new(base()),
        on_frame,
    );

    time::sleep(Duration::from_millis(2_100)).await;
    assert_eq!(frames.lock().unwrap().last().unwrap().remaining_seconds, 98);

    tx.send(Some(TimerSnapshot::stopped(100, 50))).unwrap();
    time::sleep(Duration::from_millis(10)).await;
    assert_eq!(frames.lock().unwrap().last().unwrap().remaining_seconds, 50);

    time::sleep(Duration::from_secs(3)).await;
    let last = frames.lock().unwrap().last().unwrap().clone();
    assert_eq!(last.remaining_seconds, 50);
    assert_eq!(last.phase, Phase::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_the_task() {
    let (tx, rx) = watch::channel(Some(TimerSnapshot::running(60, base())));
    let (frames, on_frame) = recorder();
    let handle = Ticker::spawn(
        rx,
        Duration::from_millis(250),
        Countdown::default(),
        TokioClock::new(base()),
        on_frame,
    );

    time::sleep(Duration::from_secs(1)).await;
    handle.cancel();
    time::sleep(Duration::from_millis(10)).await;
    let count = frames.lock().unwrap().len();
    assert!(count > 0);

    time::sleep(Duration::from_secs(5)).await;
    assert_eq!(frames.lock().unwrap().len(), count);
    // the receiver went away with the task
    assert!(tx.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_ends_when_source_closes() {
    let (tx, rx) = watch::channel(None);
    let handle = Ticker::spawn(
        rx,
        Duration::from_millis(250),
        Countdown::default(),
        TokioClock::new(base()),
        |_: &Frame| {},
    );

    drop(tx);
    time::timeout(Duration::from_secs(1), handle.join())
        .await
        .expect("ticker should stop once the sender is gone");
}

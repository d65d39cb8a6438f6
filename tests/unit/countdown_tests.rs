//! Unit tests for countdown extrapolation and re-anchoring

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use contest_preview::timer::{Countdown, Phase, TimerSnapshot};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        t0() + Duration::seconds(seconds)
    }

    #[test]
    fn test_no_frame_before_first_snapshot() {
        let mut countdown = Countdown::default();
        assert!(countdown.tick(t0()).is_none());
        assert!(countdown.remaining_at(t0()).is_none());
    }

    #[test]
    fn test_running_samples() {
        let mut countdown = Countdown::default();
        let snapshot = TimerSnapshot::running(120, t0());

        assert_eq!(countdown.apply(snapshot, t0()).remaining_seconds, 120);
        assert_eq!(countdown.tick(at(1)).unwrap().remaining_seconds, 119);
        assert_eq!(countdown.tick(at(60)).unwrap().remaining_seconds, 60);

        let expired = countdown.tick(at(121)).unwrap();
        assert_eq!(expired.remaining_seconds, 0);
        assert_eq!(expired.phase, Phase::Expired);

        // keeps evaluating, never below zero
        assert_eq!(countdown.tick(at(5000)).unwrap().remaining_seconds, 0);
    }

    #[test]
    fn test_partial_seconds_floor() {
        let mut countdown = Countdown::default();
        countdown.apply(TimerSnapshot::running(10, t0()), t0());

        let almost = t0() + Duration::milliseconds(999);
        assert_eq!(countdown.tick(almost).unwrap().remaining_seconds, 10);
        let just = t0() + Duration::milliseconds(1000);
        assert_eq!(countdown.tick(just).unwrap().remaining_seconds, 9);
    }

    #[test]
    fn test_never_increases_without_snapshot() {
        let mut countdown = Countdown::default();
        countdown.apply(TimerSnapshot::running(120, t0()), t0());

        assert_eq!(countdown.tick(at(30)).unwrap().remaining_seconds, 90);
        // wall clock stepped back
        assert_eq!(countdown.tick(at(10)).unwrap().remaining_seconds, 90);
        assert_eq!(countdown.tick(at(31)).unwrap().remaining_seconds, 89);
    }

    #[test]
    fn test_stopped_shows_remaining_verbatim() {
        let mut countdown = Countdown::default();
        let frame = countdown.apply(TimerSnapshot::stopped(3600, 1234), t0());
        assert_eq!(frame.remaining_seconds, 1234);
        assert_eq!(frame.phase, Phase::Stopped);

        let later = countdown.tick(at(600)).unwrap();
        assert_eq!(later.remaining_seconds, 1234);
        assert_eq!(later.phase, Phase::Stopped);
    }

    #[test]
    fn test_negative_values_clamp_to_zero() {
        let mut countdown = Countdown::default();
        let frame = countdown.apply(TimerSnapshot::stopped(60, -5), t0());
        assert_eq!(frame.remaining_seconds, 0);
    }

    #[test]
    fn test_missing_start_counts_from_arrival() {
        let mut countdown = Countdown::default();
        let snapshot = TimerSnapshot {
            is_running: true,
            duration_seconds: 300,
            remaining_seconds: 300,
            started_at: None,
            epoch: None,
        };

        assert_eq!(countdown.apply(snapshot, at(50)).remaining_seconds, 300);
        assert_eq!(countdown.tick(at(60)).unwrap().remaining_seconds, 290);
    }

    #[test]
    fn test_start_in_the_future_does_not_exceed_duration() {
        let mut countdown = Countdown::default();
        let frame = countdown.apply(TimerSnapshot::running(100, at(30)), t0());
        assert_eq!(frame.remaining_seconds, 100);
    }

    #[test]
    fn test_new_snapshot_reanchors_immediately() {
        let mut countdown = Countdown::default();
        countdown.apply(TimerSnapshot::running(120, t0()), t0());
        assert_eq!(countdown.tick(at(20)).unwrap().remaining_seconds, 100);

        // admin paused with 95 left
        let paused = countdown.apply(TimerSnapshot::stopped(120, 95), at(21));
        assert_eq!(paused.remaining_seconds, 95);
        assert_eq!(countdown.tick(at(40)).unwrap().remaining_seconds, 95);

        // resumed with a fresh base; jumps up without interpolating
        let resumed = countdown.apply(TimerSnapshot::running(300, at(40)), at(40));
        assert_eq!(resumed.remaining_seconds, 300);
        assert_eq!(resumed.phase, Phase::Running);
        assert_eq!(countdown.tick(at(41)).unwrap().remaining_seconds, 299);
    }

    #[test]
    fn test_identical_snapshot_keeps_value() {
        let mut countdown = Countdown::default();
        let snapshot = TimerSnapshot::running(120, t0());
        countdown.apply(snapshot.clone(), t0());
        assert_eq!(countdown.tick(at(45)).unwrap().remaining_seconds, 75);

        let again = countdown.apply(snapshot, at(45));
        assert_eq!(again.remaining_seconds, 75);
        assert_eq!(countdown.snapshot().unwrap().duration_seconds, 120);
    }

    #[test]
    fn test_extreme_wire_values_never_go_negative() {
        let mut countdown = Countdown::default();
        let lowest = TimerSnapshot {
            is_running: true,
            duration_seconds: i64::MIN,
            remaining_seconds: i64::MIN,
            started_at: Some(t0()),
            epoch: None,
        };
        let frame = countdown.apply(lowest, at(10));
        assert_eq!(frame.remaining_seconds, 0);
        assert_eq!(frame.phase, Phase::Expired);
        assert_eq!(countdown.tick(at(20)).unwrap().remaining_seconds, 0);

        let frame = countdown.apply(TimerSnapshot::stopped(i64::MAX, i64::MIN), at(30));
        assert_eq!(frame.remaining_seconds, 0);

        let frame = countdown.apply(TimerSnapshot::running(i64::MAX, t0()), at(40));
        assert_eq!(frame.remaining_seconds, i64::MAX - 40);
        assert_eq!(frame.phase, Phase::Running);
    }
}

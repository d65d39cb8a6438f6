//! Unit tests for the JSON-lines state feed

#[cfg(test)]
mod tests {
    use contest_preview::timer::TimerSnapshot;
    use contest_preview::timer::feed::pump_lines;
    use tokio::sync::watch;

    const GOOD: &str = r#"{"timer": {"is_running": false, "duration_seconds": 600, "remaining_seconds": 600}}"#;
    const OTHER: &str = r#"{"timer": {"is_running": false, "duration_seconds": 600, "remaining_seconds": 42}}"#;

    #[tokio::test]
    async fn test_skips_malformed_lines() {
        let (tx, mut rx) = watch::channel(None);
        let input = format!(
            "{}\n\ngarbage\n{{\"meja_list\": {{}}}}\n{}\n",
            GOOD, OTHER
        );

        let applied = pump_lines(input.as_bytes(), &tx).await.unwrap();

        assert_eq!(applied, 2);
        assert!(rx.has_changed().unwrap());
        assert_eq!(
            *rx.borrow_and_update(),
            Some(TimerSnapshot::stopped(600, 42))
        );
    }

    #[tokio::test]
    async fn test_identical_messages_still_notify() {
        let (tx, mut rx) = watch::channel(None);

        pump_lines(format!("{}\n", GOOD).as_bytes(), &tx).await.unwrap();
        let _ = rx.borrow_and_update();

        let applied = pump_lines(format!("{}\n", GOOD).as_bytes(), &tx).await.unwrap();
        assert_eq!(applied, 1);
        assert!(rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_stops_when_nobody_listens() {
        let (tx, rx) = watch::channel(None);
        drop(rx);

        let input = format!("{}\n{}\n{}\n", GOOD, GOOD, GOOD);
        let applied = pump_lines(input.as_bytes(), &tx).await.unwrap();
        assert_eq!(applied, 1);
    }
}

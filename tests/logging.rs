// Log file setup; runs in its own process so the global subscriber is ours
use docsweep::logging::{self, LogSettings};

#[test]
fn test_log_file_receives_events_and_init_is_once() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("logs").join("processing.log");

    logging::init(&LogSettings {
        file: Some(log_path.clone()),
        verbose: false,
    })
    .unwrap();

    tracing::info!(file = "a.pdf", "processed successfully");

    let contents = std::fs::read_to_string(&log_path).unwrap();
    assert!(contents.contains("processed successfully"), "{contents}");
    assert!(contents.contains("a.pdf"));
    assert!(!contents.contains('\u{1b}'), "log file must not carry ANSI codes");

    let again = logging::init(&LogSettings::default());
    assert!(again.is_err());
}

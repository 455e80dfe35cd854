mod utils;

use serial_test::serial;
use std::sync::Arc;
use tally_rust::output_logger::{initialize_output_logger, shutdown_output_logger, LogLevel};
use tally_rust::{log_d, log_w, Tally, TallyOptions};
use utils::mock_event_sender::MockEventSender;
use utils::mock_log_provider::{MockLogProvider, RecordedLog};

#[tokio::test]
#[serial]
async fn test_provider_receives_delivery_warnings() {
    let provider = Arc::new(MockLogProvider::new());
    let sender = Arc::new(MockEventSender::failing());

    let options = TallyOptions::builder()
        .event_sender(Some(sender.clone()))
        .output_logger_provider(Some(provider.clone()))
        .output_log_level(Some("warn"))
        .build();
    let tally = Tally::new("client-test-key", Some(Arc::new(options)));

    tally.track("e1", None).unwrap();
    assert!(tally.flush().await.is_err());

    let warnings = provider.warnings_from("BatchQueue");
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("requeueing"));

    tally.destroy();
    shutdown_output_logger();

    let logs = provider.logs.lock();
    assert_eq!(logs.first(), Some(&RecordedLog::Init));
    assert_eq!(logs.last(), Some(&RecordedLog::Shutdown));
    assert!(!logs.iter().any(|l| matches!(l, RecordedLog::Debug(_, _))));
}

#[test]
#[serial]
fn test_messages_are_masked_and_truncated() {
    let provider = Arc::new(MockLogProvider::new());
    initialize_output_logger(&Some(LogLevel::Debug), Some(provider.clone()));

    log_w!("Test", "key=client-abcdefghijk");
    log_d!("Test", "{}", "x".repeat(1_000));

    shutdown_output_logger();

    let logs = provider.logs.lock();
    assert_eq!(
        logs[1],
        RecordedLog::Warn("Test".to_string(), "key=client-abcde*****".to_string())
    );

    match &logs[2] {
        RecordedLog::Debug(_, msg) => {
            assert_eq!(msg.chars().count(), 400);
            assert!(msg.ends_with("...[TRUNCATED]"));
        }
        other => panic!("unexpected log {other:?}"),
    }
}

#[test]
#[serial]
fn test_level_filters_provider_output() {
    let provider = Arc::new(MockLogProvider::new());
    initialize_output_logger(&Some(LogLevel::Error), Some(provider.clone()));

    log_w!("Test", "hidden");
    log_d!("Test", "hidden");

    shutdown_output_logger();

    let logs = provider.logs.lock();
    assert_eq!(*logs, vec![RecordedLog::Init, RecordedLog::Shutdown]);
}

#[tokio::test]
#[serial]
async fn test_destroy_then_shutdown_tears_down_once() {
    let provider = Arc::new(MockLogProvider::new());
    let options = TallyOptions::builder()
        .event_sender(Some(Arc::new(MockEventSender::new())))
        .output_logger_provider(Some(provider.clone()))
        .output_log_level(Some("debug"))
        .build();
    let tally = Tally::new("client-test-key", Some(Arc::new(options)));

    tally.destroy();
    tally.shutdown().await.unwrap();
    shutdown_output_logger();

    let destroyed = provider
        .logs
        .lock()
        .iter()
        .filter(|log| {
            matches!(log, RecordedLog::Debug(tag, msg) if tag == "BatchQueue" && msg == "Destroyed")
        })
        .count();
    assert_eq!(destroyed, 1);
}

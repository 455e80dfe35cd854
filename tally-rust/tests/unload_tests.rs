mod utils;

use tally_rust::BatchQueueConfig;
use utils::helpers::{config_with_batch_size, QueueHarness};

#[tokio::test]
async fn test_unload_hands_off_pending_events_once() {
    let harness = QueueHarness::new(BatchQueueConfig {
        batch_size: 10,
        log_event_url: "http://localhost:9999/v1/events".to_string(),
        ..BatchQueueConfig::default()
    });
    harness.add_named(&["e1", "e2"]);

    harness.unload_signal.emit();

    assert_eq!(harness.transport.send_count(), 1);
    assert_eq!(harness.transport.url(0), "http://localhost:9999/v1/events");

    let payload = harness.transport.payload_json(0);
    let names: Vec<&str> = payload["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["e1", "e2"]);
    assert!(payload["timestamp"].is_u64());

    // nothing about the queue changes
    assert_eq!(harness.queue.size(), 2);
    assert_eq!(harness.persisted_names(), vec!["e1", "e2"]);
    assert_eq!(harness.sender.calls(), 0);
}

#[tokio::test]
async fn test_unload_with_empty_queue_sends_nothing() {
    let harness = QueueHarness::new(config_with_batch_size(10));

    harness.unload_signal.emit();

    assert_eq!(harness.transport.send_count(), 0);
}

#[tokio::test]
async fn test_destroy_unsubscribes_from_unload() {
    let harness = QueueHarness::new(config_with_batch_size(10));
    harness.add_named(&["e1"]);
    assert_eq!(harness.unload_signal.listener_count(), 1);

    harness.queue.destroy();
    harness.unload_signal.emit();

    assert_eq!(harness.unload_signal.listener_count(), 0);
    assert_eq!(harness.transport.send_count(), 0);
}

#[tokio::test]
async fn test_repeated_construction_does_not_leak_listeners() {
    let harness = QueueHarness::new(config_with_batch_size(10));

    for _ in 0..5 {
        let queue = utils::helpers::create_queue(
            config_with_batch_size(10),
            harness.storage.clone(),
            harness.sender.clone(),
            harness.transport.clone(),
            &harness.unload_signal,
        );
        queue.destroy();
    }

    assert_eq!(harness.unload_signal.listener_count(), 1);
}

#[tokio::test]
async fn test_each_emit_sends_again() {
    let harness = QueueHarness::new(config_with_batch_size(10));
    harness.add_named(&["e1"]);

    harness.unload_signal.emit();
    harness.unload_signal.emit();

    assert_eq!(harness.transport.send_count(), 2);
}

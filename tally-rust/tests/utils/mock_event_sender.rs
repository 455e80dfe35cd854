use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tally_rust::{EventSender, LogEventPayload, LogEventRequest, TallyErr};
use tokio::sync::Notify;

/// Records every batch. Results come from the script first, then from `always_fail`.
/// With `hold_deliveries` set, each call waits for `release_one` before returning.
pub struct MockEventSender {
    pub call_count: AtomicU64,
    pub sent_event_count: AtomicU64,
    pub received: Mutex<Vec<LogEventPayload>>,
    pub always_fail: AtomicBool,
    pub hold_deliveries: AtomicBool,
    scripted_results: Mutex<VecDeque<Result<(), TallyErr>>>,
    release: Notify,
}

impl Default for MockEventSender {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEventSender {
    pub fn new() -> Self {
        Self {
            call_count: AtomicU64::new(0),
            sent_event_count: AtomicU64::new(0),
            received: Mutex::new(Vec::new()),
            always_fail: AtomicBool::new(false),
            hold_deliveries: AtomicBool::new(false),
            scripted_results: Mutex::new(VecDeque::new()),
            release: Notify::new(),
        }
    }

    pub fn failing() -> Self {
        let sender = Self::new();
        sender.always_fail.store(true, Ordering::SeqCst);
        sender
    }

    pub fn fail_next(&self, times: usize) {
        let mut scripted = self.scripted_results.lock();
        for _ in 0..times {
            scripted.push_back(Err(TallyErr::LogEventError("Network error".to_string())));
        }
    }

    pub fn release_one(&self) {
        self.release.notify_one();
    }

    pub fn calls(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn batch_names(&self, index: usize) -> Vec<String> {
        self.received.lock()[index]
            .events
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    pub fn all_names(&self) -> Vec<String> {
        self.received
            .lock()
            .iter()
            .flat_map(|p| p.events.iter().map(|e| e.name.clone()))
            .collect()
    }
}

#[async_trait]
impl EventSender for MockEventSender {
    async fn send_events(&self, request: LogEventRequest) -> Result<(), TallyErr> {
        self.sent_event_count
            .fetch_add(request.event_count, Ordering::SeqCst);
        self.received.lock().push(request.payload);
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if self.hold_deliveries.load(Ordering::SeqCst) {
            self.release.notified().await;
        }

        if let Some(result) = self.scripted_results.lock().pop_front() {
            return result;
        }

        if self.always_fail.load(Ordering::SeqCst) {
            return Err(TallyErr::LogEventError("Network error".to_string()));
        }

        Ok(())
    }
}

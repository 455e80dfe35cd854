use super::batch::EventBatch;
use super::event_queue_constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_FLUSH_INTERVAL_MS, DEFAULT_MAX_DELIVERY_ATTEMPTS,
    DEFAULT_MAX_FLUSH_INTERVAL_MS, DEFAULT_MAX_QUEUE_SIZE, QUEUE_STORAGE_KEY,
};
use super::flush_interval::FlushInterval;
use super::flush_type::FlushType;
use super::queued_event::QueuedEvent;
use crate::event::tally_event::now_ms;
use crate::event::TallyEvent;
use crate::event_sender::http_event_sender::DEFAULT_LOG_EVENT_URL;
use crate::event_sender::log_event_payload::LogEventRequest;
use crate::event_sender::{EventSender, UnloadTransport};
use crate::persistent_storage::DurableSlot;
use crate::unload_signal::{UnloadSignal, UnloadSubscription};
use crate::{
    log_d, log_w, read_lock_or_return, write_lock_or_noop, write_lock_or_return, TallyErr,
    TallyOptions, TallyRuntime,
};
use parking_lot::{Mutex, RwLock};
use std::borrow::Borrow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::{sleep, Duration};

const TAG: &str = stringify!(BatchQueue);

const BG_FLUSH_TAG: &str = "batch_queue_bg_flush";
const FULL_BATCH_BG_TAG: &str = "batch_queue_full_batch";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchQueueConfig {
    pub batch_size: usize,
    pub flush_interval_ms: u64,
    pub max_flush_interval_ms: u64,
    pub max_queue_size: usize,
    /// Zero keeps retrying a failed event forever.
    pub max_delivery_attempts: u32,
    pub log_event_url: String,
}

impl Default for BatchQueueConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            max_flush_interval_ms: DEFAULT_MAX_FLUSH_INTERVAL_MS,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            max_delivery_attempts: DEFAULT_MAX_DELIVERY_ATTEMPTS,
            log_event_url: DEFAULT_LOG_EVENT_URL.to_string(),
        }
    }
}

impl BatchQueueConfig {
    /// Zero sizes and intervals fall back to defaults, and the queue always holds at least
    /// one full batch.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.batch_size == 0 {
            self.batch_size = DEFAULT_BATCH_SIZE;
        }

        if self.flush_interval_ms == 0 {
            self.flush_interval_ms = DEFAULT_FLUSH_INTERVAL_MS;
        }

        self.max_flush_interval_ms = self.max_flush_interval_ms.max(self.flush_interval_ms);
        self.max_queue_size = self.max_queue_size.max(self.batch_size);
        self
    }
}

impl From<&TallyOptions> for BatchQueueConfig {
    fn from(options: &TallyOptions) -> Self {
        let defaults = BatchQueueConfig::default();

        BatchQueueConfig {
            batch_size: options
                .batch_size
                .map_or(defaults.batch_size, |v| v as usize),
            flush_interval_ms: options
                .flush_interval_ms
                .unwrap_or(defaults.flush_interval_ms),
            max_flush_interval_ms: options
                .max_flush_interval_ms
                .unwrap_or(defaults.max_flush_interval_ms),
            max_queue_size: options
                .max_queue_size
                .map_or(defaults.max_queue_size, |v| v as usize),
            max_delivery_attempts: options
                .max_delivery_attempts
                .unwrap_or(defaults.max_delivery_attempts),
            log_event_url: options
                .log_event_url
                .clone()
                .unwrap_or(defaults.log_event_url),
        }
        .normalized()
    }
}

/// Buffers events, hands them to the [`EventSender`] in batches and keeps the pending
/// sequence mirrored in a [`DurableSlot`] so it survives a restart.
///
/// At most one delivery is in flight at a time. A failed batch goes back to the head of
/// the queue, ahead of anything added while it was in flight.
pub struct BatchQueue {
    config: BatchQueueConfig,
    pending_events: RwLock<Vec<QueuedEvent>>,
    is_processing: AtomicBool,
    is_destroyed: AtomicBool,
    flush_interval: FlushInterval,
    slot: DurableSlot,
    event_sender: Arc<dyn EventSender>,
    unload_transport: Arc<dyn UnloadTransport>,
    runtime: Arc<TallyRuntime>,
    shutdown_notify: Arc<Notify>,
    unload_subscription: Mutex<Option<UnloadSubscription>>,
}

impl BatchQueue {
    pub fn new(
        config: BatchQueueConfig,
        slot: DurableSlot,
        event_sender: Arc<dyn EventSender>,
        unload_transport: Arc<dyn UnloadTransport>,
        runtime: &Arc<TallyRuntime>,
        unload_signal: &Arc<UnloadSignal>,
    ) -> Arc<Self> {
        let config = config.normalized();

        let mut restored: Vec<QueuedEvent> = slot.get_json(QUEUE_STORAGE_KEY).unwrap_or_default();
        if !restored.is_empty() {
            log_d!(TAG, "Restored {} persisted events", restored.len());
        }
        clamp_to_size(&mut restored, config.max_queue_size);

        let queue = Arc::new(Self {
            flush_interval: FlushInterval::new(
                config.flush_interval_ms,
                config.max_flush_interval_ms,
            ),
            config,
            pending_events: RwLock::new(restored),
            is_processing: AtomicBool::new(false),
            is_destroyed: AtomicBool::new(false),
            slot,
            event_sender,
            unload_transport,
            runtime: runtime.clone(),
            shutdown_notify: Arc::new(Notify::new()),
            unload_subscription: Mutex::new(None),
        });

        queue.start_background_flush();
        queue.subscribe_to_unload(unload_signal);
        queue
    }

    pub fn config(&self) -> &BatchQueueConfig {
        &self.config
    }

    /// Never blocks on an in-flight delivery. Reaching `batch_size` empties the queue before
    /// this returns; only the send itself runs in the background.
    pub fn add(self: &Arc<Self>, event: TallyEvent) {
        let should_flush = {
            let mut pending = write_lock_or_noop!(TAG, self.pending_events);
            pending.push(QueuedEvent::new(event));
            clamp_to_size(&mut pending, self.config.max_queue_size);
            self.persist(&pending);
            pending.len() >= self.config.batch_size
        };

        if !should_flush {
            return;
        }

        if self.runtime.is_shutdown() {
            log_d!(TAG, "Runtime is shutdown, leaving full batch queued");
            return;
        }

        let in_flight = match self.take_batch(FlushType::FullBatch) {
            Some(batch) => InFlightBatch::new(self.clone(), batch),
            None => return,
        };

        // if the task never runs, dropping it hands the batch back
        let spawned = self
            .runtime
            .spawn(FULL_BATCH_BG_TAG, move |_| async move {
                // failure is already requeued and logged
                let _ = in_flight.deliver().await;
            });

        if spawned.is_none() {
            log_d!(TAG, "Full batch could not be scheduled, kept queued");
        }
    }

    pub async fn flush(&self) -> Result<(), TallyErr> {
        self.flush_with_type(FlushType::Manual).await
    }

    /// Completes immediately when the queue is empty or another delivery is in flight.
    pub async fn flush_with_type(&self, flush_type: FlushType) -> Result<(), TallyErr> {
        match self.take_batch(flush_type) {
            Some(batch) => InFlightBatch::new(self, batch).deliver().await,
            None => Ok(()),
        }
    }

    /// Waits for full-batch deliveries already running in the background.
    pub async fn await_background_deliveries(&self) {
        self.runtime
            .await_tasks_with_tag(FULL_BATCH_BG_TAG)
            .await;
    }

    pub fn size(&self) -> usize {
        read_lock_or_return!(TAG, self.pending_events, 0).len()
    }

    pub fn is_flushing(&self) -> bool {
        self.is_processing.load(Ordering::SeqCst)
    }

    pub fn current_flush_interval_ms(&self) -> u64 {
        self.flush_interval.get_current_flush_interval_ms()
    }

    /// Drops every pending event and every persisted key in the queue's namespace.
    pub fn clear(&self) {
        let mut pending = write_lock_or_noop!(TAG, self.pending_events);
        let dropped = pending.len();
        pending.clear();
        self.slot.clear();

        log_d!(TAG, "Cleared {} pending events", dropped);
    }

    /// Stops the recurring flush and releases the unload listener. Pending events stay
    /// queued, and `add`/`flush` keep working.
    pub fn destroy(&self) {
        if self.is_destroyed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.shutdown_notify.notify_one();

        let subscription = self.unload_subscription.lock().take();
        drop(subscription);

        log_d!(TAG, "Destroyed");
    }

    /// Hands the pending sequence to the unload transport once. Queue state is left alone.
    pub fn send_pending_on_unload(&self) {
        let events: Vec<TallyEvent> = {
            let pending = read_lock_or_return!(TAG, self.pending_events, ());
            pending.iter().map(|q| q.event.clone()).collect()
        };

        if events.is_empty() {
            return;
        }

        let request = LogEventRequest::new(events, now_ms());
        let bytes = match serde_json::to_vec(&request.payload) {
            Ok(bytes) => bytes,
            Err(e) => {
                log_w!(TAG, "Failed to serialize unload payload: {}", e);
                return;
            }
        };

        let handed_off = self
            .unload_transport
            .send(&self.config.log_event_url, bytes);

        log_d!(
            TAG,
            "Unload send of {} events handed off: {}",
            request.event_count,
            handed_off
        );
    }

    fn take_batch(&self, flush_type: FlushType) -> Option<EventBatch> {
        let mut pending = write_lock_or_return!(TAG, self.pending_events, None);
        if pending.is_empty() {
            return None;
        }

        if self.is_processing.swap(true, Ordering::SeqCst) {
            log_d!(TAG, "Flush already in progress, skipping {} flush", flush_type);
            return None;
        }

        let events = std::mem::take(&mut *pending);
        self.persist(&pending);

        Some(EventBatch::new(events, flush_type))
    }

    fn requeue(&self, batch: EventBatch) {
        let max_attempts = self.config.max_delivery_attempts;
        let batch_len = batch.len();

        let mut retained: Vec<QueuedEvent> = batch
            .events
            .into_iter()
            .filter_map(|mut queued| {
                queued.attempts += 1;
                if max_attempts > 0 && queued.attempts >= max_attempts {
                    None
                } else {
                    Some(queued)
                }
            })
            .collect();

        let exhausted = batch_len - retained.len();
        if exhausted > 0 {
            log_w!(
                TAG,
                "Dropped {} events after {} delivery attempts",
                exhausted,
                max_attempts
            );
        }

        let mut pending = write_lock_or_noop!(TAG, self.pending_events);
        retained.append(&mut pending);
        *pending = retained;

        clamp_to_size(&mut pending, self.config.max_queue_size);
        self.persist(&pending);
    }

    /// Puts back a batch whose delivery never finished. Not counted as an attempt.
    fn restore_interrupted(&self, batch: EventBatch) {
        log_w!(
            TAG,
            "Delivery of {} events ({}) was interrupted, restoring them",
            batch.len(),
            batch.flush_type
        );

        let mut pending = write_lock_or_noop!(TAG, self.pending_events);
        let mut restored = batch.events;
        restored.append(&mut pending);
        *pending = restored;

        clamp_to_size(&mut pending, self.config.max_queue_size);
        self.persist(&pending);
    }

    fn persist(&self, pending: &[QueuedEvent]) {
        self.slot.set_json(QUEUE_STORAGE_KEY, pending);
    }

    fn start_background_flush(self: &Arc<Self>) {
        let weak_inst = Arc::downgrade(self);
        let shutdown_notify = self.shutdown_notify.clone();

        log_d!(TAG, "Starting background flush");

        self.runtime
            .spawn(BG_FLUSH_TAG, move |rt_shutdown_notify| async move {
                loop {
                    let interval_ms = match weak_inst.upgrade() {
                        Some(strong_self) => strong_self.current_flush_interval_ms(),
                        None => break,
                    };

                    tokio::select! {
                        () = sleep(Duration::from_millis(interval_ms)) => {
                            let strong_self = match weak_inst.upgrade() {
                                Some(strong_self) => strong_self,
                                None => break,
                            };

                            // failure is already requeued and logged
                            let _ = strong_self.flush_with_type(FlushType::Scheduled).await;
                        }
                        () = rt_shutdown_notify.notified() => {
                            log_d!(TAG, "Runtime shutdown. Stopping background flush");
                            break;
                        }
                        () = shutdown_notify.notified() => {
                            log_d!(TAG, "Stopping background flush");
                            break;
                        }
                    }
                }
            });
    }

    fn subscribe_to_unload(self: &Arc<Self>, unload_signal: &Arc<UnloadSignal>) {
        let weak_inst = Arc::downgrade(self);
        let subscription = unload_signal.subscribe(move || {
            if let Some(strong_self) = weak_inst.upgrade() {
                strong_self.send_pending_on_unload();
            }
        });

        *self.unload_subscription.lock() = Some(subscription);
    }
}

/// A batch taken out of the queue while its delivery runs. Until the send returns, the
/// queue stays in the flushing state. Dropping an unfinished delivery (a cancelled
/// `flush()` future, an aborted task) returns the events to the head of the queue.
struct InFlightBatch<Q: Borrow<BatchQueue>> {
    queue: Q,
    batch: Option<EventBatch>,
}

impl<Q: Borrow<BatchQueue>> InFlightBatch<Q> {
    fn new(queue: Q, batch: EventBatch) -> Self {
        Self {
            queue,
            batch: Some(batch),
        }
    }

    async fn deliver(mut self) -> Result<(), TallyErr> {
        let request = match &self.batch {
            Some(batch) => {
                log_d!(
                    TAG,
                    "Flushing {} events ({})",
                    batch.len(),
                    batch.flush_type
                );
                batch.get_log_event_request()
            }
            None => return Ok(()),
        };

        let queue: &BatchQueue = self.queue.borrow();
        let result = queue.event_sender.send_events(request).await;

        let batch = match self.batch.take() {
            Some(batch) => batch,
            None => return Ok(()),
        };

        match result {
            Ok(()) => {
                queue.flush_interval.adjust_for_success();
                Ok(())
            }
            Err(e) => {
                log_w!(
                    TAG,
                    "Failed to deliver {} events ({}), requeueing: {}",
                    batch.len(),
                    batch.flush_type,
                    e
                );

                queue.flush_interval.adjust_for_failure();
                queue.requeue(batch);
                Err(TallyErr::DeliveryFailed(e.to_string()))
            }
        }
    }
}

impl<Q: Borrow<BatchQueue>> Drop for InFlightBatch<Q> {
    fn drop(&mut self) {
        let queue: &BatchQueue = self.queue.borrow();
        if let Some(batch) = self.batch.take() {
            queue.restore_interrupted(batch);
        }

        queue.is_processing.store(false, Ordering::SeqCst);
    }
}

fn clamp_to_size(pending: &mut Vec<QueuedEvent>, max_queue_size: usize) {
    if pending.len() <= max_queue_size {
        return;
    }

    let overflow = pending.len() - max_queue_size;
    pending.drain(..overflow);

    log_w!(TAG, "Queue is full, dropped {} oldest events", overflow);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_sender::log_event_payload::LogEventRequest;
    use crate::persistent_storage::InMemoryStorage;
    use crate::TallyOptionsBuilder;
    use async_trait::async_trait;

    struct FailingSender;

    #[async_trait]
    impl EventSender for FailingSender {
        async fn send_events(&self, _request: LogEventRequest) -> Result<(), TallyErr> {
            Err(TallyErr::LogEventError("Network error".to_string()))
        }
    }

    struct StalledSender {
        called: AtomicBool,
    }

    #[async_trait]
    impl EventSender for StalledSender {
        async fn send_events(&self, _request: LogEventRequest) -> Result<(), TallyErr> {
            self.called.store(true, Ordering::SeqCst);
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    struct NoopTransport;

    impl UnloadTransport for NoopTransport {
        fn send(&self, _url: &str, _payload: Vec<u8>) -> bool {
            true
        }
    }

    fn create_queue(config: BatchQueueConfig) -> Arc<BatchQueue> {
        let slot = DurableSlot::new(Arc::new(InMemoryStorage::new()), "test_queue_");
        BatchQueue::new(
            config,
            slot,
            Arc::new(FailingSender),
            Arc::new(NoopTransport),
            &TallyRuntime::get_runtime(),
            &UnloadSignal::new(),
        )
    }

    #[test]
    fn test_config_normalization() {
        let config = BatchQueueConfig {
            batch_size: 0,
            flush_interval_ms: 0,
            max_flush_interval_ms: 1,
            max_queue_size: 3,
            ..BatchQueueConfig::default()
        }
        .normalized();

        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.flush_interval_ms, DEFAULT_FLUSH_INTERVAL_MS);
        assert_eq!(config.max_flush_interval_ms, DEFAULT_FLUSH_INTERVAL_MS);
        assert_eq!(config.max_queue_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_config_from_options() {
        let options = TallyOptionsBuilder::new()
            .batch_size(Some(2))
            .max_delivery_attempts(Some(0))
            .log_event_url(Some("http://localhost/events".to_string()))
            .build();

        let config = BatchQueueConfig::from(&options);

        assert_eq!(config.batch_size, 2);
        assert_eq!(config.max_delivery_attempts, 0);
        assert_eq!(config.flush_interval_ms, DEFAULT_FLUSH_INTERVAL_MS);
        assert_eq!(config.log_event_url, "http://localhost/events");
    }

    #[test]
    fn test_clamp_drops_oldest() {
        let mut pending: Vec<QueuedEvent> = (0..5)
            .map(|i| QueuedEvent::new(TallyEvent::new(format!("e{i}"))))
            .collect();

        clamp_to_size(&mut pending, 3);

        let names: Vec<&str> = pending.iter().map(|q| q.event.name.as_str()).collect();
        assert_eq!(names, vec!["e2", "e3", "e4"]);
    }

    #[tokio::test]
    async fn test_failed_events_dropped_at_max_attempts() {
        let queue = create_queue(BatchQueueConfig {
            batch_size: 10,
            max_delivery_attempts: 2,
            ..BatchQueueConfig::default()
        });

        queue.add(TallyEvent::new("e1"));

        assert!(queue.flush().await.is_err());
        assert_eq!(queue.size(), 1);

        assert!(queue.flush().await.is_err());
        assert_eq!(queue.size(), 0);

        queue.destroy();
    }

    #[tokio::test]
    async fn test_zero_max_attempts_retries_forever() {
        let queue = create_queue(BatchQueueConfig {
            batch_size: 10,
            max_delivery_attempts: 0,
            ..BatchQueueConfig::default()
        });

        queue.add(TallyEvent::new("e1"));
        for _ in 0..20 {
            let _ = queue.flush().await;
        }

        assert_eq!(queue.size(), 1);
        assert!(!queue.is_flushing());

        queue.destroy();
    }

    #[tokio::test]
    async fn test_aborted_full_batch_is_restored() {
        let runtime = TallyRuntime::get_runtime();
        let sender = Arc::new(StalledSender {
            called: AtomicBool::new(false),
        });
        let queue = BatchQueue::new(
            BatchQueueConfig {
                batch_size: 2,
                ..BatchQueueConfig::default()
            },
            DurableSlot::new(Arc::new(InMemoryStorage::new()), "test_queue_"),
            sender.clone(),
            Arc::new(NoopTransport),
            &runtime,
            &UnloadSignal::new(),
        );

        queue.add(TallyEvent::new("e1"));
        queue.add(TallyEvent::new("e2"));
        assert_eq!(queue.size(), 0);

        while !sender.called.load(Ordering::SeqCst) {
            sleep(Duration::from_millis(5)).await;
        }

        runtime.shutdown();

        for _ in 0..100 {
            if queue.size() == 2 && !queue.is_flushing() {
                break;
            }
            sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(queue.size(), 2);
        assert!(!queue.is_flushing());

        queue.add(TallyEvent::new("e3"));
        assert_eq!(queue.size(), 3);
    }
}

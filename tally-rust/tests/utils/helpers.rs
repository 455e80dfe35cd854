use super::mock_event_sender::MockEventSender;
use super::mock_unload_transport::MockUnloadTransport;
use std::sync::Arc;
use std::time::Duration;
use tally_rust::{
    BatchQueue, BatchQueueConfig, DurableSlot, DurableStorage, InMemoryStorage, TallyEvent,
    TallyRuntime, UnloadSignal,
};

pub const QUEUE_PREFIX: &str = "tally_queue_";

pub async fn assert_eventually<F>(assertion: F, timeout: Duration)
where
    F: Fn() -> bool,
{
    let steps = timeout.as_millis() / 10;
    for _ in 0..steps {
        if assertion() {
            return;
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("assertion timed out");
}

#[macro_export]
macro_rules! assert_eventually {
    ($cond:expr) => {
        $crate::utils::helpers::assert_eventually($cond, std::time::Duration::from_secs(3)).await
    };
}

pub struct QueueHarness {
    pub queue: Arc<BatchQueue>,
    pub sender: Arc<MockEventSender>,
    pub transport: Arc<MockUnloadTransport>,
    pub storage: Arc<InMemoryStorage>,
    pub unload_signal: Arc<UnloadSignal>,
}

impl QueueHarness {
    pub fn new(config: BatchQueueConfig) -> Self {
        Self::with_storage(config, Arc::new(InMemoryStorage::new()))
    }

    pub fn with_storage(config: BatchQueueConfig, storage: Arc<InMemoryStorage>) -> Self {
        let sender = Arc::new(MockEventSender::new());
        let transport = Arc::new(MockUnloadTransport::new());
        let unload_signal = UnloadSignal::new();

        let queue = create_queue(
            config,
            storage.clone(),
            sender.clone(),
            transport.clone(),
            &unload_signal,
        );

        Self {
            queue,
            sender,
            transport,
            storage,
            unload_signal,
        }
    }

    /// A second queue over the same storage, as a restarted process would build it.
    pub fn reopen(&self, config: BatchQueueConfig) -> Self {
        self.queue.destroy();
        Self::with_storage(config, self.storage.clone())
    }

    pub fn add_named(&self, names: &[&str]) {
        for name in names {
            self.queue.add(TallyEvent::new(*name));
        }
    }

    pub fn persisted_names(&self) -> Vec<String> {
        let raw = match self.storage.get(&format!("{QUEUE_PREFIX}events")) {
            Ok(Some(raw)) => raw,
            _ => return vec![],
        };

        let values: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
        values
            .iter()
            .map(|v| v["name"].as_str().unwrap().to_string())
            .collect()
    }
}

pub fn create_queue(
    config: BatchQueueConfig,
    storage: Arc<dyn DurableStorage>,
    sender: Arc<MockEventSender>,
    transport: Arc<MockUnloadTransport>,
    unload_signal: &Arc<UnloadSignal>,
) -> Arc<BatchQueue> {
    BatchQueue::new(
        config,
        DurableSlot::new(storage, QUEUE_PREFIX),
        sender,
        transport,
        &TallyRuntime::get_runtime(),
        unload_signal,
    )
}

pub fn config_with_batch_size(batch_size: usize) -> BatchQueueConfig {
    BatchQueueConfig {
        batch_size,
        ..BatchQueueConfig::default()
    }
}

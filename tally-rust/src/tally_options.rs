use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::event::PageContextProvider;
use crate::event_sender::{EventSender, UnloadTransport};
use crate::output_logger::{LogLevel, OutputLogProvider};
use crate::persistent_storage::DurableStorage;
use crate::serialize_if_not_none;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct TallyOptions {
    pub batch_size: Option<u32>,
    pub flush_interval_ms: Option<u64>,
    pub max_flush_interval_ms: Option<u64>,
    pub max_queue_size: Option<u32>,
    pub max_delivery_attempts: Option<u32>, // 0 retries a failing event forever

    pub log_event_url: Option<String>,
    pub event_sender: Option<Arc<dyn EventSender>>,
    pub unload_transport: Option<Arc<dyn UnloadTransport>>,

    pub storage: Option<Arc<dyn DurableStorage>>,
    pub storage_prefix: Option<String>,

    pub page_context_provider: Option<Arc<dyn PageContextProvider>>,

    pub disable_network: Option<bool>, // HTTP sender and unload beacon fail fast without I/O
    pub disable_all_logging: Option<bool>,

    pub output_log_level: Option<LogLevel>,
    pub output_logger_provider: Option<Arc<dyn OutputLogProvider>>,
}

impl TallyOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn builder() -> TallyOptionsBuilder {
        TallyOptionsBuilder::default()
    }
}

#[derive(Default)]
pub struct TallyOptionsBuilder {
    inner: TallyOptions,
}

impl TallyOptionsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Batching

    #[must_use]
    pub fn batch_size(mut self, batch_size: Option<u32>) -> Self {
        self.inner.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn flush_interval_ms(mut self, flush_interval_ms: Option<u64>) -> Self {
        self.inner.flush_interval_ms = flush_interval_ms;
        self
    }

    #[must_use]
    pub fn max_flush_interval_ms(mut self, max_flush_interval_ms: Option<u64>) -> Self {
        self.inner.max_flush_interval_ms = max_flush_interval_ms;
        self
    }

    #[must_use]
    pub fn max_queue_size(mut self, max_queue_size: Option<u32>) -> Self {
        self.inner.max_queue_size = max_queue_size;
        self
    }

    #[must_use]
    pub fn max_delivery_attempts(mut self, max_delivery_attempts: Option<u32>) -> Self {
        self.inner.max_delivery_attempts = max_delivery_attempts;
        self
    }

    // Delivery

    #[must_use]
    pub fn log_event_url(mut self, log_event_url: Option<String>) -> Self {
        self.inner.log_event_url = log_event_url;
        self
    }

    #[must_use]
    pub fn event_sender(mut self, event_sender: Option<Arc<dyn EventSender>>) -> Self {
        self.inner.event_sender = event_sender;
        self
    }

    #[must_use]
    pub fn unload_transport(mut self, unload_transport: Option<Arc<dyn UnloadTransport>>) -> Self {
        self.inner.unload_transport = unload_transport;
        self
    }

    #[must_use]
    pub fn disable_network(mut self, disable_network: Option<bool>) -> Self {
        self.inner.disable_network = disable_network;
        self
    }

    // Storage

    #[must_use]
    pub fn storage(mut self, storage: Option<Arc<dyn DurableStorage>>) -> Self {
        self.inner.storage = storage;
        self
    }

    #[must_use]
    pub fn storage_prefix(mut self, storage_prefix: Option<String>) -> Self {
        self.inner.storage_prefix = storage_prefix;
        self
    }

    // Other

    #[must_use]
    pub fn page_context_provider(
        mut self,
        page_context_provider: Option<Arc<dyn PageContextProvider>>,
    ) -> Self {
        self.inner.page_context_provider = page_context_provider;
        self
    }

    #[must_use]
    pub fn disable_all_logging(mut self, disable_all_logging: Option<bool>) -> Self {
        self.inner.disable_all_logging = disable_all_logging;
        self
    }

    #[must_use]
    pub fn output_log_level(mut self, output_log_level: Option<&str>) -> Self {
        if let Some(level) = output_log_level {
            self.inner.output_log_level = Some(LogLevel::from(level));
        }
        self
    }

    #[must_use]
    pub fn output_logger_provider(
        mut self,
        output_logger_provider: Option<Arc<dyn OutputLogProvider>>,
    ) -> Self {
        self.inner.output_logger_provider = output_logger_provider;
        self
    }

    #[must_use]
    pub fn build(self) -> TallyOptions {
        self.inner
    }
}

impl Serialize for TallyOptions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("TallyOptions", 14)?;
        serialize_if_not_none!(state, "batch_size", &self.batch_size);
        serialize_if_not_none!(state, "flush_interval_ms", &self.flush_interval_ms);
        serialize_if_not_none!(state, "max_flush_interval_ms", &self.max_flush_interval_ms);
        serialize_if_not_none!(state, "max_queue_size", &self.max_queue_size);
        serialize_if_not_none!(state, "max_delivery_attempts", &self.max_delivery_attempts);

        serialize_if_not_none!(state, "log_event_url", &self.log_event_url);
        serialize_if_not_none!(state, "event_sender", &get_if_set(&self.event_sender));
        serialize_if_not_none!(
            state,
            "unload_transport",
            &get_if_set(&self.unload_transport)
        );

        serialize_if_not_none!(state, "storage", &get_if_set(&self.storage));
        serialize_if_not_none!(state, "storage_prefix", &self.storage_prefix);

        serialize_if_not_none!(
            state,
            "page_context_provider",
            &get_if_set(&self.page_context_provider)
        );
        serialize_if_not_none!(state, "disable_network", &self.disable_network);
        serialize_if_not_none!(state, "disable_all_logging", &self.disable_all_logging);
        serialize_if_not_none!(
            state,
            "output_logger_provider",
            &get_if_set(&self.output_logger_provider)
        );

        state.end()
    }
}

fn get_if_set<T>(s: &Option<T>) -> Option<&str> {
    s.as_ref().map(|_| "set")
}

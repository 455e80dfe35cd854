use crate::event::tally_event::{EventProperties, IDENTIFY_EVENT_NAME, PAGE_VIEW_EVENT_NAME};
use crate::event::validation::{validate_event, validate_user};
use crate::event::{TallyEvent, TallyUser};
use crate::event_queue::event_queue_constants::{DEFAULT_STORAGE_PREFIX, QUEUE_NAMESPACE};
use crate::event_queue::{BatchQueue, BatchQueueConfig, FlushType};
use crate::event_sender::{EventSender, HttpBeaconTransport, HttpEventSender, UnloadTransport};
use crate::output_logger::initialize_output_logger;
use crate::persistent_storage::{DurableSlot, DurableStorage, InMemoryStorage};
use crate::tally_metadata::TallyMetadata;
use crate::unload_signal::UnloadSignal;
use crate::{
    log_d, log_w, read_lock_or_return, write_lock_or_noop, write_lock_or_return, TallyErr,
    TallyOptions, TallyRuntime,
};
use parking_lot::RwLock;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

const TAG: &str = stringify!(Tally);

const USER_STORAGE_KEY: &str = "user";
const SESSION_STORAGE_KEY: &str = "session_id";
const PAGE_NAME_PROPERTY: &str = "pageName";

pub struct Tally {
    options: Arc<TallyOptions>,
    runtime: Arc<TallyRuntime>,
    event_sender: Arc<dyn EventSender>,
    queue: Arc<BatchQueue>,
    slot: DurableSlot,
    unload_signal: Arc<UnloadSignal>,
    user: RwLock<Option<TallyUser>>,
    session_id: RwLock<String>,
}

impl Tally {
    pub fn new(api_key: &str, options: Option<Arc<TallyOptions>>) -> Self {
        let options = options.unwrap_or_default();

        initialize_output_logger(
            &options.output_log_level,
            options.output_logger_provider.clone(),
        );

        let metadata = TallyMetadata::get_metadata();
        log_d!(
            TAG,
            "Creating {} {} instance with options {}",
            metadata.sdk_type,
            metadata.sdk_version,
            serde_json::to_string(options.as_ref()).unwrap_or_default()
        );

        let runtime = TallyRuntime::get_runtime();

        let storage: Arc<dyn DurableStorage> = match options.storage.clone() {
            Some(storage) => storage,
            None => Arc::new(InMemoryStorage::new()),
        };
        let prefix = options
            .storage_prefix
            .as_deref()
            .unwrap_or(DEFAULT_STORAGE_PREFIX);
        let slot = DurableSlot::new(storage, prefix);

        let user = slot.get_json::<TallyUser>(USER_STORAGE_KEY);
        let session_id = match slot.get_json::<String>(SESSION_STORAGE_KEY) {
            Some(session_id) => session_id,
            None => start_session(&slot),
        };

        let event_sender = initialize_event_sender(api_key, &options);
        let unload_transport = initialize_unload_transport(api_key, &options, &runtime);
        let unload_signal = UnloadSignal::new();

        let queue = BatchQueue::new(
            BatchQueueConfig::from(options.as_ref()),
            slot.namespaced(QUEUE_NAMESPACE),
            event_sender.clone(),
            unload_transport,
            &runtime,
            &unload_signal,
        );

        Tally {
            options,
            runtime,
            event_sender,
            queue,
            slot,
            unload_signal,
            user: RwLock::new(user),
            session_id: RwLock::new(session_id),
        }
    }

    /// Queues a custom event.
    ///
    /// # Errors
    ///
    /// Returns [`TallyErr::InvalidEvent`] for a blank or oversized name or a blank property
    /// key. Nothing is queued in that case.
    pub fn track(&self, name: &str, properties: Option<EventProperties>) -> Result<(), TallyErr> {
        validate_event(name, properties.as_ref())?;
        self.enqueue(self.build_event(name, properties));
        Ok(())
    }

    /// Queues a `tally::page_view` event carrying `name` as its `pageName` property.
    pub fn page(&self, name: &str, properties: Option<EventProperties>) -> Result<(), TallyErr> {
        validate_event(name, properties.as_ref())?;

        let mut properties = properties.unwrap_or_default();
        properties.insert(PAGE_NAME_PROPERTY.to_string(), json!(name));

        self.enqueue(self.build_event(PAGE_VIEW_EVENT_NAME, Some(properties)));
        Ok(())
    }

    /// Remembers `user` (in memory and in storage) and queues a `tally::identify` event.
    /// Every later event carries the user's id.
    pub fn identify(&self, user: TallyUser) -> Result<(), TallyErr> {
        validate_user(&user)?;

        self.slot.set_json(USER_STORAGE_KEY, &user);

        let mut properties = EventProperties::new();
        if let Some(email) = &user.email {
            properties.insert("email".to_string(), json!(email));
        }
        if let Some(traits) = &user.traits {
            properties.insert("traits".to_string(), json!(traits));
        }

        {
            let mut current = write_lock_or_return!(
                TAG,
                self.user,
                Err(TallyErr::LockFailure("user".to_string()))
            );
            *current = Some(user);
        }

        let properties = if properties.is_empty() {
            None
        } else {
            Some(properties)
        };
        self.enqueue(self.build_event(IDENTIFY_EVENT_NAME, properties));
        Ok(())
    }

    pub async fn flush(&self) -> Result<(), TallyErr> {
        self.queue.flush().await
    }

    /// Forgets the identified user, drops every pending event and starts a new session.
    pub fn reset(&self) {
        self.queue.clear();
        self.slot.remove(USER_STORAGE_KEY);

        {
            let mut user = write_lock_or_noop!(TAG, self.user);
            *user = None;
        }

        let new_session_id = start_session(&self.slot);
        let mut session_id = write_lock_or_noop!(TAG, self.session_id);
        *session_id = new_session_id;

        log_d!(TAG, "Reset user and session");
    }

    /// Stops the recurring flush and the unload hook without flushing.
    pub fn destroy(&self) {
        self.queue.destroy();
    }

    pub async fn shutdown(&self) -> Result<(), TallyErr> {
        self.shutdown_with_timeout(Duration::from_secs(3)).await
    }

    /// Sends whatever is pending, then releases the timer, the unload hook and the
    /// runtime's background tasks.
    pub async fn shutdown_with_timeout(&self, timeout: Duration) -> Result<(), TallyErr> {
        log_d!(
            TAG,
            "Shutting down Tally with timeout {}ms",
            timeout.as_millis()
        );

        let start = Instant::now();
        let shutdown_result = tokio::select! {
            () = tokio::time::sleep(timeout) => {
                log_w!(TAG, "Tally shutdown timed out. {}", start.elapsed().as_millis());
                Err(TallyErr::ShutdownFailure(
                    "Shutdown timed out".to_string()
                ))
            }
            sub_result = async {
                self.queue.await_background_deliveries().await;
                let flushed = self.queue.flush_with_type(FlushType::Shutdown).await;
                let sender_shutdown = self.event_sender.shutdown().await;
                flushed.and(sender_shutdown)
            } => {
                if let Err(e) = &sub_result {
                    log_w!(TAG, "Error during shutdown: {}", e);
                }
                sub_result
            }
        };

        self.queue.destroy();
        self.runtime.shutdown();
        shutdown_result
    }

    pub fn get_user(&self) -> Option<TallyUser> {
        read_lock_or_return!(TAG, self.user, None).clone()
    }

    pub fn get_session_id(&self) -> String {
        read_lock_or_return!(TAG, self.session_id, String::new()).clone()
    }

    pub fn pending_event_count(&self) -> usize {
        self.queue.size()
    }

    /// The host calls `emit()` on this when the process is about to end.
    pub fn unload_signal(&self) -> Arc<UnloadSignal> {
        self.unload_signal.clone()
    }

    fn enqueue(&self, event: TallyEvent) {
        if self.options.disable_all_logging.unwrap_or(false) {
            log_d!(
                TAG,
                "Did not enqueue {} because all logging is disabled",
                event.name
            );
            return;
        }

        self.queue.add(event);
    }

    fn build_event(&self, name: &str, properties: Option<EventProperties>) -> TallyEvent {
        let context = self
            .options
            .page_context_provider
            .as_ref()
            .map(|provider| provider.current_page());

        TallyEvent::new(name)
            .with_properties(properties)
            .with_user_id(self.get_user().map(|u| u.user_id))
            .with_session_id(Some(self.get_session_id()))
            .with_context(context)
    }
}

fn start_session(slot: &DurableSlot) -> String {
    let session_id = uuid::Uuid::new_v4().to_string();
    slot.set_json(SESSION_STORAGE_KEY, &session_id);
    session_id
}

fn initialize_event_sender(api_key: &str, options: &TallyOptions) -> Arc<dyn EventSender> {
    if let Some(sender) = options.event_sender.clone() {
        log_d!(TAG, "Using provided EventSender");
        return sender;
    }

    Arc::new(HttpEventSender::new(
        api_key,
        options.log_event_url.as_ref(),
        options.disable_network,
    ))
}

fn initialize_unload_transport(
    api_key: &str,
    options: &TallyOptions,
    runtime: &Arc<TallyRuntime>,
) -> Arc<dyn UnloadTransport> {
    if let Some(transport) = options.unload_transport.clone() {
        return transport;
    }

    Arc::new(HttpBeaconTransport::new(
        api_key,
        runtime,
        options.disable_network,
    ))
}

pub use event::{PageContext, PageContextProvider, TallyEvent, TallyUser};
pub use event::tally_event::EventProperties;
pub use event_queue::{BatchQueue, BatchQueueConfig, FlushType};
pub use event_sender::{
    log_event_payload::{LogEventPayload, LogEventRequest},
    EventSender, HttpBeaconTransport, HttpEventSender, UnloadTransport,
};
pub use persistent_storage::{DurableSlot, DurableStorage, InMemoryStorage};
#[cfg(not(target_family = "wasm"))]
pub use persistent_storage::LocalFileStorage;
pub use tally::Tally;
pub use tally_err::TallyErr;
pub use tally_options::{TallyOptions, TallyOptionsBuilder};
pub use tally_runtime::TallyRuntime;
pub use unload_signal::{UnloadSignal, UnloadSubscription};

pub mod event;
pub mod event_queue;
pub mod event_sender;
pub mod networking;
pub mod output_logger;
pub mod persistent_storage;
pub mod tally_metadata;
pub mod tally_options;
pub mod tally_runtime;
pub mod unload_signal;

mod logging_utils;
mod macros;
mod tally;
mod tally_err;

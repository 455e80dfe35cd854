pub use event_sender_trait::*;
pub use http_event_sender::HttpEventSender;
pub use unload_transport::{HttpBeaconTransport, UnloadTransport};

pub mod event_sender_trait;
pub mod http_event_sender;
pub mod log_event_payload;
pub mod unload_transport;

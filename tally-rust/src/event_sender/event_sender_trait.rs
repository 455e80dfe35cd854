use crate::event_sender::log_event_payload::LogEventRequest;
use crate::TallyErr;
use async_trait::async_trait;

/// Delivers one batch to the collection endpoint.
///
/// `Ok` must mean the endpoint acknowledged the batch. Any transport error, non-success
/// status or endpoint-reported failure must be an `Err`, which makes the queue keep the
/// events for a later attempt.
#[async_trait]
pub trait EventSender: Send + Sync {
    async fn send_events(&self, request: LogEventRequest) -> Result<(), TallyErr>;

    async fn shutdown(&self) -> Result<(), TallyErr> {
        Ok(())
    }
}

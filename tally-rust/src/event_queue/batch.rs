use super::flush_type::FlushType;
use super::queued_event::QueuedEvent;
use crate::event::tally_event::now_ms;
use crate::event_sender::log_event_payload::LogEventRequest;

pub struct EventBatch {
    pub flush_type: FlushType,
    pub events: Vec<QueuedEvent>,
}

impl EventBatch {
    pub fn new(events: Vec<QueuedEvent>, flush_type: FlushType) -> Self {
        Self { flush_type, events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get_log_event_request(&self) -> LogEventRequest {
        let events = self.events.iter().map(|q| q.event.clone()).collect();
        LogEventRequest::new(events, now_ms())
    }
}

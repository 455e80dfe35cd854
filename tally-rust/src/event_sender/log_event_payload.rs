use crate::event::TallyEvent;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEventPayload {
    pub events: Vec<TallyEvent>,
    pub timestamp: u64,
}

#[derive(Clone, Debug)]
pub struct LogEventRequest {
    pub payload: LogEventPayload,
    pub event_count: u64,
}

impl LogEventRequest {
    #[must_use]
    pub fn new(events: Vec<TallyEvent>, timestamp: u64) -> Self {
        let event_count = events.len() as u64;
        Self {
            payload: LogEventPayload { events, timestamp },
            event_count,
        }
    }
}

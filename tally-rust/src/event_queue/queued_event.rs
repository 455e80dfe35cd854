use crate::event::TallyEvent;
use serde::{Deserialize, Serialize};

/// A pending event plus the number of failed deliveries it has been part of.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueuedEvent {
    #[serde(flatten)]
    pub event: TallyEvent,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub attempts: u32,
}

impl QueuedEvent {
    #[must_use]
    pub fn new(event: TallyEvent) -> Self {
        Self { event, attempts: 0 }
    }
}

impl From<TallyEvent> for QueuedEvent {
    fn from(event: TallyEvent) -> Self {
        Self::new(event)
    }
}

fn is_zero(attempts: &u32) -> bool {
    *attempts == 0
}

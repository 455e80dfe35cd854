use super::page_context::PageContext;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const PAGE_VIEW_EVENT_NAME: &str = "tally::page_view";
pub const IDENTIFY_EVENT_NAME: &str = "tally::identify";

pub type EventProperties = HashMap<String, Value>;

/// A single tracked occurrence. Never mutated once it has been handed to the queue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyEvent {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<EventProperties>,

    pub timestamp: u64,

    #[serde(rename = "userID", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(rename = "sessionID", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<PageContext>,
}

impl TallyEvent {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: None,
            timestamp: now_ms(),
            user_id: None,
            session_id: None,
            context: None,
        }
    }

    #[must_use]
    pub fn with_properties(mut self, properties: Option<EventProperties>) -> Self {
        self.properties = properties;
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_user_id(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    #[must_use]
    pub fn with_session_id(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: Option<PageContext>) -> Self {
        self.context = context;
        self
    }

    pub fn get_property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|p| p.get(key))
    }
}

pub(crate) fn now_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_event_gets_timestamp() {
        let before = now_ms();
        let event = TallyEvent::new("signup");
        assert!(event.timestamp >= before);
        assert_eq!(event.name, "signup");
        assert!(event.properties.is_none());
    }

    #[test]
    fn test_serialization_omits_empty_fields() {
        let event = TallyEvent::new("e1")
            .with_timestamp(1_700_000_000_000)
            .with_property("plan", "pro");

        let value = json!(event);
        assert_eq!(
            value,
            json!({
                "name": "e1",
                "properties": {"plan": "pro"},
                "timestamp": 1_700_000_000_000u64
            })
        );
    }

    #[test]
    fn test_nested_properties_survive_json() {
        let event = TallyEvent::new("checkout")
            .with_property("cart", json!({"items": [1, 2.5, "three", null, true]}))
            .with_user_id(Some("u-1".into()))
            .with_session_id(Some("s-1".into()));

        let text = serde_json::to_string(&event).unwrap();
        assert!(text.contains("\"userID\":\"u-1\""));
        assert!(text.contains("\"sessionID\":\"s-1\""));

        let parsed: TallyEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, event);
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyUser {
    #[serde(rename = "userID")]
    pub user_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traits: Option<HashMap<String, Value>>,
}

impl TallyUser {
    #[must_use]
    pub fn with_user_id(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            traits: None,
        }
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn trait_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.traits
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }
}

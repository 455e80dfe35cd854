use serde::Serialize;
use std::collections::HashMap;

pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SDK_TYPE: &str = "tally-rust";

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TallyMetadata {
    pub sdk_type: String,
    pub sdk_version: String,
}

impl TallyMetadata {
    #[must_use]
    pub fn get_metadata() -> Self {
        Self {
            sdk_type: SDK_TYPE.to_string(),
            sdk_version: SDK_VERSION.to_string(),
        }
    }

    #[must_use]
    pub fn get_constant_request_headers(api_key: &str) -> HashMap<String, String> {
        HashMap::from([
            ("tally-api-key".to_string(), api_key.to_string()),
            ("tally-sdk-type".to_string(), SDK_TYPE.to_string()),
            ("tally-sdk-version".to_string(), SDK_VERSION.to_string()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_headers_carry_key_and_sdk() {
        let headers = TallyMetadata::get_constant_request_headers("client-key");

        assert_eq!(headers.get("tally-api-key").unwrap(), "client-key");
        assert_eq!(headers.get("tally-sdk-type").unwrap(), SDK_TYPE);
        assert_eq!(headers.get("tally-sdk-version").unwrap(), SDK_VERSION);
    }
}

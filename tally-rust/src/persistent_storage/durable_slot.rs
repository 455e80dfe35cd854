use super::DurableStorage;
use crate::{log_d, log_w};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

const TAG: &str = stringify!(DurableSlot);

/// A prefix-namespaced view over a [`DurableStorage`] holding JSON values.
///
/// Nothing here returns an error: a storage or serde failure is logged and
/// reported as "absent" (reads) or `false` (writes).
#[derive(Clone)]
pub struct DurableSlot {
    prefix: String,
    storage: Arc<dyn DurableStorage>,
}

impl DurableSlot {
    pub fn new(storage: Arc<dyn DurableStorage>, prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            storage,
        }
    }

    /// A slot whose keys live under this slot's prefix followed by `sub_prefix`.
    #[must_use]
    pub fn namespaced(&self, sub_prefix: &str) -> Self {
        Self {
            prefix: format!("{}{}", self.prefix, sub_prefix),
            storage: self.storage.clone(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full_key = self.full_key(key);
        let raw = match self.storage.get(&full_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log_w!(TAG, "Failed to read {}: {}", full_key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log_w!(TAG, "Discarding unreadable value at {}: {}", full_key, e);
                None
            }
        }
    }

    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let full_key = self.full_key(key);
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                log_w!(TAG, "Failed to serialize value for {}: {}", full_key, e);
                return false;
            }
        };

        match self.storage.set(&full_key, &raw) {
            Ok(()) => true,
            Err(e) => {
                log_w!(TAG, "Failed to persist {}: {}", full_key, e);
                false
            }
        }
    }

    pub fn remove(&self, key: &str) -> bool {
        let full_key = self.full_key(key);
        match self.storage.remove(&full_key) {
            Ok(()) => true,
            Err(e) => {
                log_w!(TAG, "Failed to remove {}: {}", full_key, e);
                false
            }
        }
    }

    /// Removes every key under this slot's prefix, leaving other namespaces alone.
    pub fn clear(&self) -> bool {
        let keys = match self.storage.keys() {
            Ok(keys) => keys,
            Err(e) => {
                log_w!(TAG, "Failed to list keys for {}: {}", self.prefix, e);
                return false;
            }
        };

        let mut all_removed = true;
        for key in keys.iter().filter(|k| k.starts_with(&self.prefix)) {
            if let Err(e) = self.storage.remove(key) {
                log_w!(TAG, "Failed to remove {}: {}", key, e);
                all_removed = false;
            }
        }

        log_d!(TAG, "Cleared namespace {}", self.prefix);
        all_removed
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

use super::DurableStorage;
use crate::TallyErr;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;

const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
pub struct InMemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values
            .try_read_for(LOCK_TIMEOUT)
            .map(|v| v.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_failure() -> TallyErr {
    TallyErr::LockFailure(stringify!(InMemoryStorage).to_string())
}

impl DurableStorage for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, TallyErr> {
        let values = self.values.try_read_for(LOCK_TIMEOUT).ok_or_else(lock_failure)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), TallyErr> {
        let mut values = self.values.try_write_for(LOCK_TIMEOUT).ok_or_else(lock_failure)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), TallyErr> {
        let mut values = self.values.try_write_for(LOCK_TIMEOUT).ok_or_else(lock_failure)?;
        values.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, TallyErr> {
        let values = self.values.try_read_for(LOCK_TIMEOUT).ok_or_else(lock_failure)?;
        Ok(values.keys().cloned().collect())
    }
}

use crate::TallyErr;

/// String-keyed persistence medium shared by everything that wants to survive a restart.
///
/// Implementations may fail; callers go through [`super::DurableSlot`], which degrades
/// failures to "absent" / "not persisted".
pub trait DurableStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, TallyErr>;
    fn set(&self, key: &str, value: &str) -> Result<(), TallyErr>;
    fn remove(&self, key: &str) -> Result<(), TallyErr>;
    fn keys(&self) -> Result<Vec<String>, TallyErr>;
}

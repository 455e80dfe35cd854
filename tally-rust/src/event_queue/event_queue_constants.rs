pub const DEFAULT_BATCH_SIZE: usize = 20;
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_MAX_FLUSH_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 1_000;
pub const DEFAULT_MAX_DELIVERY_ATTEMPTS: u32 = 5;
pub const DEFAULT_STORAGE_PREFIX: &str = "tally_";

pub const QUEUE_NAMESPACE: &str = "queue_";
pub const QUEUE_STORAGE_KEY: &str = "events";

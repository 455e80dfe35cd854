pub mod batch;
pub mod batch_queue;
pub mod event_queue_constants;
pub mod flush_interval;
pub mod flush_type;
pub mod queued_event;

pub use batch_queue::{BatchQueue, BatchQueueConfig};
pub use flush_type::FlushType;

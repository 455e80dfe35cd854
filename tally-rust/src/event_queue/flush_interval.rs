use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::Relaxed;

use crate::log_d;

const TAG: &str = stringify!(FlushInterval);

/// The period of the recurring flush. Failures push it out (doubling, up to `max_ms`),
/// successes pull it back (halving, down to `min_ms`).
pub struct FlushInterval {
    min_ms: u64,
    max_ms: u64,
    current_flush_interval_ms: AtomicU64,
}

impl FlushInterval {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        let max_ms = max_ms.max(min_ms);
        Self {
            min_ms,
            max_ms,
            current_flush_interval_ms: AtomicU64::new(min_ms),
        }
    }

    pub fn get_current_flush_interval_ms(&self) -> u64 {
        self.current_flush_interval_ms.load(Relaxed)
    }

    pub fn adjust_for_success(&self) {
        let current = self.get_current_flush_interval_ms();
        let adjusted = (current / 2).max(self.min_ms);
        self.current_flush_interval_ms.store(adjusted, Relaxed);

        if adjusted != current {
            log_d!(
                TAG,
                "Flush interval adjusted for success: was {}ms, now {}ms",
                current,
                adjusted
            );
        }
    }

    pub fn adjust_for_failure(&self) {
        let current = self.get_current_flush_interval_ms();
        let adjusted = current.saturating_mul(2).min(self.max_ms);
        self.current_flush_interval_ms.store(adjusted, Relaxed);

        log_d!(
            TAG,
            "Flush interval adjusted for failure: was {}ms, now {}ms",
            current,
            adjusted
        );
    }
}

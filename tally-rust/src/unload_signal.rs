use crate::log_d;
use dashmap::DashMap;
use std::sync::{Arc, Weak};

const TAG: &str = stringify!(UnloadSignal);

type UnloadCallback = Arc<dyn Fn() + Send + Sync>;

/// Raised by the host when the process (or page) is about to go away.
///
/// Listeners are held by [`UnloadSubscription`] handles and removed when the handle is
/// dropped, so repeated construct/teardown cycles never pile up stale listeners.
#[derive(Default)]
pub struct UnloadSignal {
    listeners: DashMap<String, UnloadCallback>,
}

impl UnloadSignal {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> UnloadSubscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = uuid::Uuid::new_v4().to_string();
        self.listeners.insert(id.clone(), Arc::new(callback));

        UnloadSubscription {
            id,
            signal: Arc::downgrade(self),
        }
    }

    pub fn emit(&self) {
        // snapshot first so a listener may unsubscribe without deadlocking the map
        let callbacks: Vec<UnloadCallback> = self
            .listeners
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        log_d!(TAG, "Notifying {} unload listeners", callbacks.len());

        for callback in callbacks {
            callback();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn unsubscribe_by_id(&self, id: &str) {
        self.listeners.remove(id);
    }
}

pub struct UnloadSubscription {
    id: String,
    signal: Weak<UnloadSignal>,
}

impl UnloadSubscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for UnloadSubscription {
    fn drop(&mut self) {
        if let Some(signal) = self.signal.upgrade() {
            signal.unsubscribe_by_id(&self.id);
        }
    }
}

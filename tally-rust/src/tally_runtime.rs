use futures::future::join_all;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::{log_d, log_e, log_w};

const TAG: &str = stringify!(TallyRuntime);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TaskId {
    tag: String,
    tokio_id: tokio::task::Id,
}

pub struct TallyRuntime {
    pub runtime_handle: Handle,
    inner_runtime: Mutex<Option<Arc<Runtime>>>,
    spawned_tasks: Arc<Mutex<HashMap<TaskId, JoinHandle<()>>>>,
    shutdown_notify: Arc<Notify>,
    is_shutdown: Arc<AtomicBool>,
}

impl TallyRuntime {
    #[must_use]
    pub fn get_runtime() -> Arc<TallyRuntime> {
        let (opt_runtime, runtime_handle) = create_runtime_if_required();

        Arc::new(TallyRuntime {
            inner_runtime: Mutex::new(opt_runtime),
            runtime_handle,
            spawned_tasks: Arc::new(Mutex::new(HashMap::new())),
            shutdown_notify: Arc::new(Notify::new()),
            is_shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn is_shutdown(&self) -> bool {
        self.is_shutdown.load(Ordering::SeqCst)
    }

    pub fn shutdown(&self) {
        self.is_shutdown.store(true, Ordering::SeqCst);
        self.shutdown_notify.notify_waiters();

        if let Ok(mut lock) = self.spawned_tasks.lock() {
            for (_, task) in lock.drain() {
                task.abort();
            }
        }
    }

    pub fn spawn<F, Fut>(&self, tag: &str, task: F) -> Option<tokio::task::Id>
    where
        F: FnOnce(Arc<Notify>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.is_shutdown.load(Ordering::SeqCst) {
            log_w!(TAG, "Runtime is shutdown, not spawning task {}", tag);
            return None;
        }

        let tag_string = tag.to_string();
        let shutdown_notify = self.shutdown_notify.clone();
        let spawned_tasks = self.spawned_tasks.clone();

        log_d!(TAG, "Spawning task {}", tag);

        let handle = self.runtime_handle.spawn(async move {
            let task_id = tokio::task::id();
            log_d!(TAG, "Executing task {}.{}", tag_string, task_id);
            task(shutdown_notify).await;
            remove_join_handle_with_id(spawned_tasks, tag_string, &task_id);
        });

        Some(self.insert_join_handle(tag, handle))
    }

    pub async fn await_tasks_with_tag(&self, tag: &str) {
        let mut handles = Vec::new();

        match self.spawned_tasks.lock() {
            Ok(mut lock) => {
                let keys: Vec<TaskId> = lock.keys().filter(|k| k.tag == tag).cloned().collect();
                for key in &keys {
                    if let Some(handle) = lock.remove(key) {
                        handles.push(handle);
                    }
                }
            }
            Err(e) => {
                log_e!(TAG, "Failed to lock spawned tasks {}", e);
                return;
            }
        };

        join_all(handles).await;
    }

    fn insert_join_handle(&self, tag: &str, handle: JoinHandle<()>) -> tokio::task::Id {
        let handle_id = handle.id();

        // the task may already be done, in which case its handle is not worth tracking
        if handle.is_finished() {
            return handle_id;
        }

        let task_id = TaskId {
            tag: tag.to_string(),
            tokio_id: handle_id,
        };

        match self.spawned_tasks.lock() {
            Ok(mut lock) => {
                lock.insert(task_id, handle);
            }
            Err(e) => {
                log_e!(TAG, "An error occurred while inserting join handle: {}", e);
            }
        }

        handle_id
    }
}

fn remove_join_handle_with_id(
    spawned_tasks: Arc<Mutex<HashMap<TaskId, JoinHandle<()>>>>,
    tag: String,
    handle_id: &tokio::task::Id,
) {
    let task_id = TaskId {
        tag,
        tokio_id: *handle_id,
    };

    match spawned_tasks.lock() {
        Ok(mut lock) => {
            lock.remove(&task_id);
        }
        Err(e) => {
            log_e!(TAG, "An error occurred while removing join handle {}", e);
        }
    }
}

fn create_runtime_if_required() -> (Option<Arc<Runtime>>, Handle) {
    if let Ok(handle) = Handle::try_current() {
        log_d!(TAG, "Existing tokio runtime found");
        return (None, handle);
    }

    log_d!(TAG, "No tokio runtime found, creating one");
    let rt = Arc::new(
        Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("tally")
            .enable_all()
            .build()
            .expect("Failed to find or create a tokio Runtime"),
    );

    let handle = rt.handle().clone();
    (Some(rt), handle)
}

impl Drop for TallyRuntime {
    fn drop(&mut self) {
        self.shutdown();

        let opt_inner = match self.inner_runtime.lock() {
            Ok(mut inner_runtime) => inner_runtime.take(),
            Err(e) => {
                log_e!(TAG, "Failed to lock inner runtime {}", e);
                None
            }
        };

        let inner = match opt_inner {
            Some(inner) => inner,
            None => {
                log_d!(TAG, "Runtime owned by tokio");
                return;
            }
        };

        if Handle::try_current().is_err() {
            // not inside a runtime, dropping here is safe
            return;
        }

        log_w!(TAG, "Attempt to shutdown runtime from inside runtime");
        std::thread::spawn(move || {
            drop(inner);
        });
    }
}

use parking_lot::Mutex;
use std::time::Duration;
use tally_rust::output_logger::OutputLogProvider;

#[derive(Debug, PartialEq)]
pub enum RecordedLog {
    Debug(String, String),
    Info(String, String),
    Warn(String, String),
    Error(String, String),
    Init,
    Shutdown,
}

pub struct MockLogProvider {
    pub logs: Mutex<Vec<RecordedLog>>,
}

impl MockLogProvider {
    pub fn new() -> Self {
        Self {
            logs: Mutex::new(Vec::new()),
        }
    }

    pub fn warnings_from(&self, tag: &str) -> Vec<String> {
        self.logs
            .try_lock_for(Duration::from_secs(5))
            .unwrap()
            .iter()
            .filter_map(|log| match log {
                RecordedLog::Warn(t, msg) if t == tag => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, log: RecordedLog) {
        self.logs.try_lock_for(Duration::from_secs(5)).unwrap().push(log);
    }
}

impl OutputLogProvider for MockLogProvider {
    fn initialize(&self) {
        self.push(RecordedLog::Init);
    }

    fn debug(&self, tag: &str, msg: String) {
        self.push(RecordedLog::Debug(tag.to_string(), msg));
    }

    fn info(&self, tag: &str, msg: String) {
        self.push(RecordedLog::Info(tag.to_string(), msg));
    }

    fn warn(&self, tag: &str, msg: String) {
        self.push(RecordedLog::Warn(tag.to_string(), msg));
    }

    fn error(&self, tag: &str, msg: String) {
        self.push(RecordedLog::Error(tag.to_string(), msg));
    }

    fn shutdown(&self) {
        self.push(RecordedLog::Shutdown);
    }
}

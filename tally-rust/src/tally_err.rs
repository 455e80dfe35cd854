use crate::networking::NetworkError;
use serde::Serialize;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize)]
pub enum TallyErr {
    // Input
    InvalidEvent(String),
    InvalidUser(String),

    // Delivery
    DeliveryFailed(String),
    LogEventError(String),
    NetworkError(NetworkError, Option<String>),

    // Serialization
    SerializationError(String),

    // Persistence
    StorageError(String),
    FileError(String),

    // System / Concurrency
    LockFailure(String),

    // Shutdown
    ShutdownFailure(String),
}

impl Display for TallyErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TallyErr::InvalidEvent(msg) => write!(f, "Invalid event: {msg}"),
            TallyErr::InvalidUser(msg) => write!(f, "Invalid user: {msg}"),

            TallyErr::DeliveryFailed(msg) => write!(f, "Event delivery failed: {msg}"),
            TallyErr::LogEventError(msg) => write!(f, "Log event error: {msg}"),
            TallyErr::NetworkError(error, context) => match context {
                Some(context) => write!(f, "NetworkError|{context}|{error}"),
                None => write!(f, "NetworkError|{error}"),
            },

            TallyErr::SerializationError(msg) => write!(f, "Serialization error: {msg}"),

            TallyErr::StorageError(msg) => write!(f, "Storage error: {msg}"),
            TallyErr::FileError(msg) => write!(f, "File error: {msg}"),

            TallyErr::LockFailure(msg) => write!(f, "Failed to acquire lock: {msg}"),

            TallyErr::ShutdownFailure(e) => write!(f, "Shutdown failure: {e}"),
        }
    }
}

impl std::error::Error for TallyErr {}

impl TallyErr {
    pub fn name(&self) -> &'static str {
        match self {
            TallyErr::InvalidEvent(_) => "InvalidEvent",
            TallyErr::InvalidUser(_) => "InvalidUser",

            TallyErr::DeliveryFailed(_) => "DeliveryFailed",
            TallyErr::LogEventError(_) => "LogEventError",
            TallyErr::NetworkError(e, _) => e.name(),

            TallyErr::SerializationError(_) => "SerializationError",

            TallyErr::StorageError(_) => "StorageError",
            TallyErr::FileError(_) => "FileError",

            TallyErr::LockFailure(_) => "LockFailure",

            TallyErr::ShutdownFailure(_) => "ShutdownFailure",
        }
    }
}

//! SDK-side diagnostics. Every line is truncated and has API keys masked before it
//! reaches either the host's [`OutputLogProvider`] or the `log` facade, which falls back
//! to `simple_logger` when the host has not installed a logger of its own.

use crate::logging_utils::{sanitize_api_key, truncate_message};
use log::Level;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Warn;
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const TARGET_PREFIX: &str = "tally";

/// Ordered quietest first, so a line is kept when its level is `<=` the threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    None,
    Error,
    Warn,
    Info,
    Debug,
}

impl From<&str> for LogLevel {
    fn from(level: &str) -> Self {
        match level.to_lowercase().as_str() {
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" => LogLevel::Warn,
            "error" => LogLevel::Error,
            "none" => LogLevel::None,
            _ => DEFAULT_LOG_LEVEL,
        }
    }
}

impl LogLevel {
    fn as_log_level(self) -> Option<Level> {
        match self {
            LogLevel::Debug => Some(Level::Debug),
            LogLevel::Info => Some(Level::Info),
            LogLevel::Warn => Some(Level::Warn),
            LogLevel::Error => Some(Level::Error),
            LogLevel::None => None,
        }
    }
}

/// Lets a host route SDK output into its own logging pipeline instead of `simple_logger`.
pub trait OutputLogProvider: Send + Sync {
    fn initialize(&self);
    fn debug(&self, tag: &str, msg: String);
    fn info(&self, tag: &str, msg: String);
    fn warn(&self, tag: &str, msg: String);
    fn error(&self, tag: &str, msg: String);
    fn shutdown(&self);
}

enum Sink {
    Unset,
    LogFacade,
    Provider(Arc<dyn OutputLogProvider>),
}

struct OutputLogger {
    threshold: LogLevel,
    sink: Sink,
}

lazy_static::lazy_static! {
    static ref OUTPUT_LOGGER: RwLock<OutputLogger> = RwLock::new(OutputLogger {
        threshold: DEFAULT_LOG_LEVEL,
        sink: Sink::Unset,
    });
}

/// First call wins until [`shutdown_output_logger`] resets the sink.
pub fn initialize_output_logger(
    level: &Option<LogLevel>,
    provider: Option<Arc<dyn OutputLogProvider>>,
) {
    let mut logger = match write_logger() {
        Some(logger) => logger,
        None => return,
    };

    if !matches!(logger.sink, Sink::Unset) {
        return;
    }

    logger.threshold = level.unwrap_or(DEFAULT_LOG_LEVEL);
    logger.sink = match provider {
        Some(provider) => {
            provider.initialize();
            Sink::Provider(provider)
        }
        None => {
            install_simple_logger(logger.threshold);
            Sink::LogFacade
        }
    };
}

pub fn shutdown_output_logger() {
    let mut logger = match write_logger() {
        Some(logger) => logger,
        None => return,
    };

    if let Sink::Provider(provider) = std::mem::replace(&mut logger.sink, Sink::Unset) {
        provider.shutdown();
    }

    logger.threshold = DEFAULT_LOG_LEVEL;
}

pub fn is_enabled(level: LogLevel) -> bool {
    if level == LogLevel::None {
        return false;
    }

    match read_logger() {
        Some(logger) => level <= logger.threshold,
        None => false,
    }
}

pub fn log_message(tag: &str, level: LogLevel, msg: String) {
    let line = sanitize_api_key(&truncate_message(msg));

    let provider = read_logger().and_then(|logger| match &logger.sink {
        Sink::Provider(provider) => Some(provider.clone()),
        Sink::Unset | Sink::LogFacade => None,
    });

    match provider {
        Some(provider) => match level {
            LogLevel::Debug => provider.debug(tag, line),
            LogLevel::Info => provider.info(tag, line),
            LogLevel::Warn => provider.warn(tag, line),
            LogLevel::Error => provider.error(tag, line),
            LogLevel::None => {}
        },
        None => {
            if let Some(level) = level.as_log_level() {
                let target = format!("{TARGET_PREFIX}::{tag}");
                log::log!(target: target.as_str(), level, "{}", line);
            }
        }
    }
}

fn install_simple_logger(threshold: LogLevel) {
    let level = match threshold.as_log_level() {
        Some(level) => level,
        None => return,
    };

    // the host may already own the `log` facade
    if simple_logger::init_with_level(level).is_err() {
        log::set_max_level(level.to_level_filter());
    }
}

fn read_logger() -> Option<RwLockReadGuard<'static, OutputLogger>> {
    let logger = OUTPUT_LOGGER.try_read_for(LOCK_TIMEOUT);
    if logger.is_none() {
        eprintln!("[Tally] Timed out acquiring read lock on output logger");
    }
    logger
}

fn write_logger() -> Option<RwLockWriteGuard<'static, OutputLogger>> {
    let logger = OUTPUT_LOGGER.try_write_for(LOCK_TIMEOUT);
    if logger.is_none() {
        eprintln!("[Tally] Timed out acquiring write lock on output logger");
    }
    logger
}

#[doc(hidden)]
#[macro_export]
macro_rules! log_at {
    ($level:expr, $tag:expr, $($arg:tt)*) => {{
        let level = $level;
        if $crate::output_logger::is_enabled(level) {
            $crate::output_logger::log_message($tag, level, format!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! log_d {
    ($tag:expr, $($arg:tt)*) => {
        $crate::log_at!($crate::output_logger::LogLevel::Debug, $tag, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_i {
    ($tag:expr, $($arg:tt)*) => {
        $crate::log_at!($crate::output_logger::LogLevel::Info, $tag, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_w {
    ($tag:expr, $($arg:tt)*) => {
        $crate::log_at!($crate::output_logger::LogLevel::Warn, $tag, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_e {
    ($tag:expr, $($arg:tt)*) => {
        $crate::log_at!($crate::output_logger::LogLevel::Error, $tag, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!(LogLevel::from("DEBUG"), LogLevel::Debug);
        assert_eq!(LogLevel::from("none"), LogLevel::None);
        assert_eq!(LogLevel::from("verbose"), DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Debug);
        assert!(LogLevel::None < LogLevel::Error);
    }
}

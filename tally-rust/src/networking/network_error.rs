use serde::Serialize;
use std::fmt;

use crate::logging_utils::sanitize_api_key;

type RequestUrl = String;

#[derive(PartialEq, Debug, Clone, Serialize)]
pub enum NetworkError {
    ShutdownError(RequestUrl),
    DisableNetworkOn(RequestUrl),
    SerializationError(RequestUrl, String),

    RequestFailed(RequestUrl, Option<u16>, String),
    RetriesExhausted(RequestUrl, Option<u16>, u32, String),
    RequestNotRetryable(RequestUrl, Option<u16>, String),
}

impl NetworkError {
    pub fn name(&self) -> &'static str {
        match self {
            NetworkError::ShutdownError(_) => "ShutdownError",
            NetworkError::DisableNetworkOn(_) => "DisableNetworkOn",
            NetworkError::SerializationError(_, _) => "SerializationError",
            NetworkError::RequestFailed(_, _, _) => "RequestFailed",
            NetworkError::RetriesExhausted(_, _, _, _) => "RetriesExhausted",
            NetworkError::RequestNotRetryable(_, _, _) => "RequestNotRetryable",
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            NetworkError::RequestFailed(_, status, _)
            | NetworkError::RetriesExhausted(_, status, _, _)
            | NetworkError::RequestNotRetryable(_, status, _) => *status,
            _ => None,
        }
    }
}

fn status_display(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "None".to_string(),
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::ShutdownError(url) => {
                let url = sanitize_api_key(url);
                write!(f, "ShutdownError: {url}")
            }
            NetworkError::DisableNetworkOn(url) => {
                let url = sanitize_api_key(url);
                write!(f, "DisableNetworkOn: {url}")
            }
            NetworkError::SerializationError(url, s) => {
                let url = sanitize_api_key(url);
                let s = sanitize_api_key(s);
                write!(f, "SerializationError: {url} {s}")
            }
            NetworkError::RequestFailed(url, status, message) => {
                let url = sanitize_api_key(url);
                let message = sanitize_api_key(message);
                let status = status_display(status);
                write!(f, "RequestFailed: {url} {status} {message}")
            }
            NetworkError::RetriesExhausted(url, status, attempts, message) => {
                let url = sanitize_api_key(url);
                let message = sanitize_api_key(message);
                let status = status_display(status);
                write!(
                    f,
                    "RetriesExhausted: {url} status({status}) attempts({attempts}) {message}"
                )
            }
            NetworkError::RequestNotRetryable(url, status, message) => {
                let url = sanitize_api_key(url);
                let message = sanitize_api_key(message);
                let status = status_display(status);
                write!(f, "RequestNotRetryable: {url} status({status}) {message}")
            }
        }
    }
}

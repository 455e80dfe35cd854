use super::providers::get_network_provider;
use super::{HttpMethod, NetworkError, NetworkProvider, RequestArgs};
use crate::{log_e, log_i, log_w};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const RETRY_CODES: [u16; 8] = [408, 500, 502, 503, 504, 522, 524, 599];
const SHUTDOWN_ERROR: &str = "Request was aborted because the client is shutting down";

const TAG: &str = stringify!(NetworkClient);

pub struct NetworkClient {
    headers: HashMap<String, String>,
    is_shutdown: Arc<AtomicBool>,
    disable_network: bool,
    net_provider: Arc<dyn NetworkProvider>,
}

impl NetworkClient {
    #[must_use]
    pub fn new(headers: Option<HashMap<String, String>>, disable_network: Option<bool>) -> Self {
        NetworkClient {
            headers: headers.unwrap_or_default(),
            is_shutdown: Arc::new(AtomicBool::new(false)),
            disable_network: disable_network.unwrap_or(false),
            net_provider: get_network_provider(),
        }
    }

    pub fn shutdown(&self) {
        self.is_shutdown.store(true, Ordering::SeqCst);
    }

    pub async fn post(
        &self,
        mut request_args: RequestArgs,
        body: Option<Vec<u8>>,
    ) -> Result<String, NetworkError> {
        request_args.body = body;
        self.make_request(HttpMethod::POST, request_args).await
    }

    async fn make_request(
        &self,
        method: HttpMethod,
        mut request_args: RequestArgs,
    ) -> Result<String, NetworkError> {
        let url = request_args.url.clone();
        if self.disable_network {
            log_i!(TAG, "Network is disabled, not making requests");
            return Err(NetworkError::DisableNetworkOn(url));
        }

        let is_shutdown = match &request_args.is_shutdown {
            Some(is_shutdown) => is_shutdown.clone(),
            None => self.is_shutdown.clone(),
        };

        request_args.populate_headers(self.headers.clone());

        let mut attempt = 0;

        loop {
            if is_shutdown.load(Ordering::SeqCst) {
                log_i!(TAG, "{}", SHUTDOWN_ERROR);
                return Err(NetworkError::ShutdownError(url));
            }

            let response = self.net_provider.send(&method, &request_args).await;

            let status = response.status_code;
            let success = (200..300).contains(&status);

            let error_message = response
                .error
                .unwrap_or_else(|| get_error_message_for_status(status));

            if success {
                return get_data_as_string(&url, response.data);
            }

            if !RETRY_CODES.contains(&status) {
                log_e!(TAG, "status:{} message:{}", status, error_message);
                return Err(NetworkError::RequestNotRetryable(
                    url,
                    non_zero_status(status),
                    error_message,
                ));
            }

            if attempt >= request_args.retries {
                log_e!(
                    TAG,
                    "Network error, retries exhausted: {} {}",
                    status,
                    error_message
                );
                return Err(NetworkError::RetriesExhausted(
                    url,
                    non_zero_status(status),
                    attempt + 1,
                    error_message,
                ));
            }

            attempt += 1;
            let backoff_ms = 2_u64.pow(attempt) * 100;

            log_w!(
                TAG,
                "Network request failed with status code {} (attempt {}), will retry after {}ms...\n{}",
                status,
                attempt,
                backoff_ms,
                error_message
            );

            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        }
    }
}

fn non_zero_status(status: u16) -> Option<u16> {
    if status == 0 {
        return None;
    }

    Some(status)
}

fn get_error_message_for_status(status: u16) -> String {
    if (200..300).contains(&status) {
        return String::new();
    }

    match status {
        400 => "Bad Request".to_string(),
        401 => "Unauthorized".to_string(),
        403 => "Forbidden".to_string(),
        404 => "Not Found".to_string(),
        405 => "Method Not Allowed".to_string(),
        408 => "Request Timeout".to_string(),
        413 => "Payload Too Large".to_string(),
        429 => "Too Many Requests".to_string(),
        500 => "Internal Server Error".to_string(),
        502 => "Bad Gateway".to_string(),
        503 => "Service Unavailable".to_string(),
        504 => "Gateway Timeout".to_string(),
        0 => "Unknown Error".to_string(),
        _ => format!("HTTP Error {status}"),
    }
}

fn get_data_as_string(url: &str, data: Option<Vec<u8>>) -> Result<String, NetworkError> {
    match data {
        Some(data) => String::from_utf8(data).map_err(|e| {
            NetworkError::SerializationError(url.to_string(), e.to_string())
        }),
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disable_network_fails_fast() {
        let client = NetworkClient::new(None, Some(true));
        let args = RequestArgs {
            url: "https://api.tally.dev/v1/events".to_string(),
            ..RequestArgs::default()
        };

        let result = client.post(args, Some(vec![])).await;

        assert_eq!(
            result,
            Err(NetworkError::DisableNetworkOn(
                "https://api.tally.dev/v1/events".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_shutdown_aborts_requests() {
        let client = NetworkClient::new(None, None);
        client.shutdown();

        let args = RequestArgs {
            url: "https://api.tally.dev/v1/events".to_string(),
            ..RequestArgs::default()
        };

        let result = client.post(args, None).await;
        assert!(matches!(result, Err(NetworkError::ShutdownError(_))));
    }

    #[test]
    fn test_error_message_for_status() {
        assert_eq!(get_error_message_for_status(204), "");
        assert_eq!(get_error_message_for_status(503), "Service Unavailable");
        assert_eq!(get_error_message_for_status(418), "HTTP Error 418");
    }
}

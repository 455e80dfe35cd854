use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;

use crate::logging_utils::sanitize_api_key;
use crate::networking::{HttpMethod, NetworkProvider, RequestArgs, Response};
use crate::{log_w, TallyErr};

const TAG: &str = stringify!(NetworkProviderReqwest);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct NetworkProviderReqwest {
    client: reqwest::Client,
}

impl NetworkProviderReqwest {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn build_request(&self, method: &HttpMethod, args: &RequestArgs) -> reqwest::RequestBuilder {
        let method_actual = match method {
            HttpMethod::GET => Method::GET,
            HttpMethod::POST => Method::POST,
        };
        let is_post = method_actual == Method::POST;

        let mut request = self.client.request(method_actual, &args.url);

        let timeout_duration = match args.timeout_ms > 0 {
            true => Duration::from_millis(args.timeout_ms),
            false => DEFAULT_TIMEOUT,
        };
        request = request.timeout(timeout_duration);

        if let Some(headers) = &args.headers {
            for (key, value) in headers {
                request = request.header(key, value);
            }
        }

        if is_post {
            let bytes = args.body.clone().unwrap_or_default();
            let byte_len = bytes.len();

            request = request.body(bytes);
            request = request.header("Content-Length", byte_len.to_string());
        }

        request
    }
}

impl Default for NetworkProviderReqwest {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkProvider for NetworkProviderReqwest {
    async fn send(&self, method: &HttpMethod, args: &RequestArgs) -> Response {
        if let Some(is_shutdown) = &args.is_shutdown {
            if is_shutdown.load(std::sync::atomic::Ordering::SeqCst) {
                return Response {
                    status_code: 0,
                    data: None,
                    error: Some("Request was shutdown".to_string()),
                    headers: None,
                };
            }
        }

        let request = self.build_request(method, args);

        match request.send().await {
            Ok(response) => {
                let status_code = response.status().as_u16();
                let headers = get_response_headers(&response);
                let data = response.bytes().await.ok().map(|bytes| bytes.to_vec());
                Response {
                    status_code,
                    data,
                    error: None,
                    headers,
                }
            }
            Err(e) => {
                let error_message = get_error_message(e);
                log_w!(
                    TAG,
                    "Request Error: {} {}",
                    sanitize_api_key(&args.url),
                    error_message
                );
                Response {
                    status_code: 0,
                    data: None,
                    error: Some(error_message),
                    headers: None,
                }
            }
        }
    }

    async fn shutdown(&self) -> Result<(), TallyErr> {
        Ok(())
    }
}

fn get_error_message(error: reqwest::Error) -> String {
    let mut error_message = error.to_string();

    if let Some(url_error) = error.url() {
        error_message.push_str(&format!(". URL: {url_error}"));
    }

    if let Some(status_error) = error.status() {
        error_message.push_str(&format!(". Status: {status_error}"));
    }

    error_message
}

fn get_response_headers(response: &reqwest::Response) -> Option<HashMap<String, String>> {
    let headers = response.headers();
    if headers.is_empty() {
        return None;
    }

    let mut headers_map = HashMap::new();
    for (key, value) in headers {
        headers_map.insert(key.to_string(), value.to_str().unwrap_or("").to_string());
    }

    Some(headers_map)
}

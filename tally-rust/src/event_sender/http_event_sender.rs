use crate::event_sender::log_event_payload::LogEventRequest;
use crate::event_sender::EventSender;
use crate::networking::{NetworkClient, RequestArgs};
use crate::tally_metadata::TallyMetadata;
use crate::{log_d, TallyErr};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

pub const DEFAULT_LOG_EVENT_URL: &str = "https://api.tally.dev/v1/events";
const LOG_EVENT_RETRIES: u32 = 2;

#[derive(Deserialize)]
struct LogEventResult {
    success: Option<bool>,
}

const TAG: &str = stringify!(HttpEventSender);

pub struct HttpEventSender {
    log_event_url: String,
    network: NetworkClient,
}

impl HttpEventSender {
    #[must_use]
    pub fn new(api_key: &str, log_event_url: Option<&String>, disable_network: Option<bool>) -> Self {
        let headers = TallyMetadata::get_constant_request_headers(api_key);

        let log_event_url = match log_event_url {
            Some(u) => u,
            _ => DEFAULT_LOG_EVENT_URL,
        }
        .to_string();

        Self {
            log_event_url,
            network: NetworkClient::new(Some(headers), disable_network),
        }
    }

    pub fn log_event_url(&self) -> &str {
        &self.log_event_url
    }

    pub async fn send_events_over_http(&self, request: &LogEventRequest) -> Result<(), TallyErr> {
        log_d!(TAG, "Logging Events ({})", request.event_count);

        let headers = HashMap::from([
            (
                "tally-event-count".to_string(),
                request.event_count.to_string(),
            ),
            ("Content-Type".to_owned(), "application/json".to_owned()),
        ]);

        let bytes = serde_json::to_vec(&request.payload)
            .map_err(|e| TallyErr::SerializationError(e.to_string()))?;

        let response_str = self
            .network
            .post(
                RequestArgs {
                    url: self.log_event_url.clone(),
                    retries: LOG_EVENT_RETRIES,
                    headers: Some(headers),
                    ..RequestArgs::default()
                },
                Some(bytes),
            )
            .await
            .map_err(|err| TallyErr::NetworkError(err, Some("Log event failure".into())))?;

        // an empty acknowledgement body is still an acknowledgement
        if response_str.trim().is_empty() {
            return Ok(());
        }

        match serde_json::from_str::<LogEventResult>(&response_str) {
            Ok(LogEventResult {
                success: Some(false),
            }) => Err(TallyErr::LogEventError(
                "Endpoint reported the batch as unsuccessful".to_string(),
            )),
            Ok(_) => Ok(()),
            Err(e) => {
                log_d!(TAG, "Ignoring unreadable acknowledgement body: {}", e);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl EventSender for HttpEventSender {
    async fn send_events(&self, request: LogEventRequest) -> Result<(), TallyErr> {
        self.send_events_over_http(&request).await
    }

    async fn shutdown(&self) -> Result<(), TallyErr> {
        self.network.shutdown();
        Ok(())
    }
}

use crate::networking::{NetworkClient, RequestArgs};
use crate::tally_metadata::TallyMetadata;
use crate::{log_d, TallyRuntime};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

const TAG: &str = stringify!(HttpBeaconTransport);
const BEACON_BG_TAG: &str = "unload_beacon";
const BEACON_TIMEOUT_MS: u64 = 2_000;

/// Last-chance delivery used while the host is going away.
///
/// `send` must not block and reports only whether the payload was handed off,
/// never whether it arrived.
pub trait UnloadTransport: Send + Sync {
    fn send(&self, url: &str, payload: Vec<u8>) -> bool;
}

pub struct HttpBeaconTransport {
    network: Arc<NetworkClient>,
    runtime: Weak<TallyRuntime>,
}

impl HttpBeaconTransport {
    #[must_use]
    pub fn new(api_key: &str, runtime: &Arc<TallyRuntime>, disable_network: Option<bool>) -> Self {
        let headers = TallyMetadata::get_constant_request_headers(api_key);
        Self {
            network: Arc::new(NetworkClient::new(Some(headers), disable_network)),
            runtime: Arc::downgrade(runtime),
        }
    }
}

impl UnloadTransport for HttpBeaconTransport {
    fn send(&self, url: &str, payload: Vec<u8>) -> bool {
        let runtime = match self.runtime.upgrade() {
            Some(runtime) => runtime,
            None => return false,
        };

        let network = self.network.clone();
        let args = RequestArgs {
            url: url.to_string(),
            timeout_ms: BEACON_TIMEOUT_MS,
            headers: Some(HashMap::from([(
                "Content-Type".to_owned(),
                "application/json".to_owned(),
            )])),
            ..RequestArgs::default()
        };

        let spawned = runtime.spawn(BEACON_BG_TAG, move |_| async move {
            if let Err(e) = network.post(args, Some(payload)).await {
                log_d!(TAG, "Unload beacon was not delivered: {}", e);
            }
        });

        spawned.is_some()
    }
}

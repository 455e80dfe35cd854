use super::NetworkProvider;
use std::sync::Arc;

#[cfg(feature = "reqwest")]
pub mod net_provider_reqwest;

#[cfg(not(feature = "reqwest"))]
mod net_provider_noop;

#[cfg(feature = "reqwest")]
lazy_static::lazy_static! {
    static ref REQWEST_NETWORK_PROVIDER: Arc<dyn NetworkProvider> =
        Arc::new(net_provider_reqwest::NetworkProviderReqwest::new());
}

#[cfg(not(feature = "reqwest"))]
lazy_static::lazy_static! {
    static ref NOOP_NETWORK_PROVIDER: Arc<dyn NetworkProvider> =
        Arc::new(net_provider_noop::NetworkProviderNoop {});
}

#[cfg(feature = "reqwest")]
pub fn get_network_provider() -> Arc<dyn NetworkProvider> {
    REQWEST_NETWORK_PROVIDER.clone()
}

#[cfg(not(feature = "reqwest"))]
pub fn get_network_provider() -> Arc<dyn NetworkProvider> {
    NOOP_NETWORK_PROVIDER.clone()
}

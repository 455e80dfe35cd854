use parking_lot::Mutex;
use serde_json::Value;
use tally_rust::UnloadTransport;

#[derive(Default)]
pub struct MockUnloadTransport {
    pub sent: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MockUnloadTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn payload_json(&self, index: usize) -> Value {
        serde_json::from_slice(&self.sent.lock()[index].1).unwrap()
    }

    pub fn url(&self, index: usize) -> String {
        self.sent.lock()[index].0.clone()
    }
}

impl UnloadTransport for MockUnloadTransport {
    fn send(&self, url: &str, payload: Vec<u8>) -> bool {
        self.sent.lock().push((url.to_string(), payload));
        true
    }
}

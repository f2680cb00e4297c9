//! Outbound alert requests.
//!
//! [`Dispatcher`] turns an [`AlertRequest`] into one GET request, sends it
//! synchronously over the configured [`Transport`](transport::Transport)
//! and classifies the reply. It never retries; repeated alerts come from
//! the trigger retrigger cadence and the health schedule.

pub mod request;
pub mod response;
pub mod transport;

use crate::core::alerts::model::AlertRequest;
use crate::core::error::DispatchError;

use request::OutboundRequest;
use response::{Delivery, ResponseClassifier};
use transport::Transport;

pub struct Dispatcher {
    host: String,
    base_path: String,
    transport: Box<dyn Transport + Send>,
    classifier: ResponseClassifier,
}

impl Dispatcher {
    pub fn new(
        host: impl Into<String>,
        base_path: impl Into<String>,
        transport: Box<dyn Transport + Send>,
    ) -> Self {
        Self {
            host: host.into(),
            base_path: base_path.into(),
            transport,
            classifier: ResponseClassifier::new(),
        }
    }

    /// Send one request and classify the response. Blocks until the
    /// transport returns.
    pub fn dispatch(&mut self, request: &AlertRequest) -> Result<Delivery, DispatchError> {
        let outbound = OutboundRequest::new(&self.host, &self.base_path, request);
        log::debug!("GET {} (host {})", outbound.path, outbound.host);

        let raw = self.transport.send(&outbound)?;
        let delivery = self.classifier.classify(&raw, request.is_health())?;

        if let Some(health) = &delivery.health {
            log::debug!("Health reply: {}", serde_json::Value::Object(health.clone()));
        }
        Ok(delivery)
    }
}

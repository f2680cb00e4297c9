//! Request line construction.

use crate::core::alerts::model::AlertRequest;

/// A fully encoded GET request for one alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub host: String,
    pub path: String,
}

impl OutboundRequest {
    pub fn new(host: &str, base_path: &str, request: &AlertRequest) -> Self {
        Self {
            host: host.to_string(),
            path: encode_path(base_path, request),
        }
    }

    /// Serialized request head. There is no body.
    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
            self.path, self.host
        )
        .into_bytes()
    }
}

/// `{base}?intent=health` or `{base}?intent=primary&alertId={id}[&resetting=true]`.
pub fn encode_path(base_path: &str, request: &AlertRequest) -> String {
    match request {
        AlertRequest::Health => format!("{base_path}?intent=health"),
        AlertRequest::InitialAlert { id } | AlertRequest::Retrigger { id } => {
            format!("{base_path}?intent=primary&alertId={id}")
        }
        AlertRequest::Reset { id } => {
            format!("{base_path}?intent=primary&alertId={id}&resetting=true")
        }
    }
}

// Alert model types shared by the monitors, the scheduler and the dispatcher.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Stable identifier of a monitored trigger, sent as `alertId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerId(String);

impl TriggerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ids travel unescaped in the query string, so only
    /// alphanumerics, hyphen and underscore are allowed.
    pub fn is_url_safe(&self) -> bool {
        !self.0.is_empty()
            && self.0.len() <= 64
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Timing parameters for one trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerTiming {
    pub alert_threshold: Duration,
    pub retrigger_interval: Duration,
}

/// One outbound notification, built by the component that decided to send it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertRequest {
    Health,
    InitialAlert { id: TriggerId },
    Retrigger { id: TriggerId },
    /// Always sent with `resetting=true`.
    Reset { id: TriggerId },
}

/// Wire-level request kind, without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    Health,
    InitialAlert,
    Retrigger,
    Reset,
}

impl AlertRequest {
    pub fn kind(&self) -> AlertKind {
        match self {
            Self::Health => AlertKind::Health,
            Self::InitialAlert { .. } => AlertKind::InitialAlert,
            Self::Retrigger { .. } => AlertKind::Retrigger,
            Self::Reset { .. } => AlertKind::Reset,
        }
    }

    pub fn trigger_id(&self) -> Option<&TriggerId> {
        match self {
            Self::Health => None,
            Self::InitialAlert { id } | Self::Retrigger { id } | Self::Reset { id } => Some(id),
        }
    }

    pub fn is_resetting(&self) -> bool {
        matches!(self, Self::Reset { .. })
    }

    pub fn is_health(&self) -> bool {
        matches!(self, Self::Health)
    }
}

impl AlertKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Health => "health check",
            Self::InitialAlert => "initial alert",
            Self::Retrigger => "retrigger",
            Self::Reset => "reset",
        }
    }
}

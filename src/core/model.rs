use serde::{Deserialize, Serialize};

/// A digital line number on the signal source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinId(pub u32);

impl std::fmt::Display for PinId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gpio{}", self.0)
    }
}

/// Symbolic events handed to the feedback collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackEvent {
    Connected,
    Disconnected,
    Confused,
    Disgruntled,
    ButtonPushed,
    GenericSuccess,
}

impl FeedbackEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Confused => "confused",
            Self::Disgruntled => "disgruntled",
            Self::ButtonPushed => "button-pushed",
            Self::GenericSuccess => "generic-success",
        }
    }
}

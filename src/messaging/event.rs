use crate::types::constants::phoenix_events;
use serde::{Deserialize, Serialize};

/// Type-safe channel events
///
/// Serialized as the bare event string so it can sit in the wire tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChannelEvent {
    /// System events (phx_*)
    System(SystemEvent),

    /// Any application event (diffs, redirects, ...), carried opaquely
    Custom(String),
}

impl ChannelEvent {
    /// Parse a string into a ChannelEvent
    pub fn parse(s: &str) -> Self {
        match SystemEvent::parse(s) {
            Some(sys) => Self::System(sys),
            None => Self::Custom(s.to_string()),
        }
    }

    /// Convert event to string representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::System(sys) => sys.as_str(),
            Self::Custom(s) => s,
        }
    }
}

impl From<&str> for ChannelEvent {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for ChannelEvent {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<ChannelEvent> for String {
    fn from(event: ChannelEvent) -> Self {
        match event {
            ChannelEvent::System(sys) => sys.as_str().to_string(),
            ChannelEvent::Custom(s) => s,
        }
    }
}

impl std::fmt::Display for ChannelEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Phoenix system events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemEvent {
    Join,
    Reply,
    Close,
    Error,
    Heartbeat,
}

impl SystemEvent {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            phoenix_events::JOIN => Some(Self::Join),
            phoenix_events::REPLY => Some(Self::Reply),
            phoenix_events::CLOSE => Some(Self::Close),
            phoenix_events::ERROR => Some(Self::Error),
            phoenix_events::HEARTBEAT => Some(Self::Heartbeat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Join => phoenix_events::JOIN,
            Self::Reply => phoenix_events::REPLY,
            Self::Close => phoenix_events::CLOSE,
            Self::Error => phoenix_events::ERROR,
            Self::Heartbeat => phoenix_events::HEARTBEAT,
        }
    }
}

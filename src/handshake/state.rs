use crate::scenario::Check;
use crate::types::{LoadError, Result};

/// Lifecycle of a single handshake attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Idle,
    Connecting,
    AwaitingReply,
    /// Terminal; the outcome says how it got here
    Closed,
}

/// How a handshake attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeOutcome {
    Verified,
    CsrfMissing,
    SessionMissing,
    StaticMissing,
    ElementIdMissing,
    ConnectFailed,
    JoinRejected,
    TimedOut,
    TransportError,
}

impl HandshakeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Verified)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::CsrfMissing => "csrf missing",
            Self::SessionMissing => "session missing",
            Self::StaticMissing => "static missing",
            Self::ElementIdMissing => "element id missing",
            Self::ConnectFailed => "connect failed",
            Self::JoinRejected => "join rejected",
            Self::TimedOut => "timed out",
            Self::TransportError => "transport error",
        }
    }
}

impl std::fmt::Display for HandshakeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final record of one handshake attempt
#[derive(Debug, Clone, PartialEq)]
pub struct HandshakeReport {
    pub topic: String,
    pub outcome: HandshakeOutcome,
    /// Diagnostic for failing outcomes (raw reply, error text, ...)
    pub detail: Option<String>,
    pub checks: Vec<Check>,
}

impl HandshakeReport {
    /// Turns a failing outcome into the error that aborts the iteration.
    pub fn into_result(self) -> Result<Self> {
        if self.outcome.is_success() {
            return Ok(self);
        }

        Err(LoadError::Handshake {
            outcome: self.outcome,
            detail: self
                .detail
                .unwrap_or_else(|| format!("handshake on {} failed", self.topic)),
        })
    }
}

use crate::handshake::HandshakeOutcome;
use crate::page::CredentialError;
use thiserror::Error;

/// Errors that abort a scenario iteration.
#[derive(Error, Debug)]
pub enum LoadError {
    /// WebSocket protocol error (invalid frame, broken stream, etc.)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// HTTP request error while fetching a page
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error (malformed target or page path)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid or missing configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Page returned an unexpected status or lacked its content marker
    #[error("Page check failed for {url}: {reason}")]
    PageCheck { url: String, reason: String },

    /// Page did not embed the LiveView handshake credentials
    #[error("Credential extraction failed: {0}")]
    Credentials(#[from] CredentialError),

    /// Socket handshake ended in a failing outcome
    #[error("Handshake {outcome}: {detail}")]
    Handshake {
        outcome: HandshakeOutcome,
        detail: String,
    },
}

impl LoadError {
    /// Handshake outcome behind this error, if the failure happened at or after extraction.
    pub fn outcome(&self) -> Option<HandshakeOutcome> {
        match self {
            Self::Credentials(e) => Some(e.outcome()),
            Self::Handshake { outcome, .. } => Some(*outcome),
            _ => None,
        }
    }
}

/// Convenience type alias for `Result<T, LoadError>`.
pub type Result<T> = std::result::Result<T, LoadError>;

use super::{ChannelEvent, SystemEvent};
use crate::page::HandshakeCredentials;
use crate::types::constants::{STATUS_OK, STATUS_OK_MARKER};
use crate::types::{JoinParams, JoinPayload, ProtocolMessage, Result};
use serde_json::Value;

/// Encodes a message into its wire text.
pub fn encode(message: &ProtocolMessage) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

/// Decodes a well-formed wire tuple back into a message.
pub fn decode(text: &str) -> Result<ProtocolMessage> {
    Ok(serde_json::from_str(text)?)
}

/// Builds the `phx_join` for a freshly loaded page.
///
/// `join_ref` is used for both the join ref and the message ref.
pub fn join_message(
    credentials: &HandshakeCredentials,
    page_url: &str,
    join_ref: String,
) -> Result<ProtocolMessage> {
    let payload = JoinPayload {
        url: page_url.to_string(),
        params: JoinParams {
            csrf_token: credentials.csrf_token.clone(),
            mounts: 0,
        },
        session: credentials.session.clone(),
        static_data: credentials.static_data.clone(),
    };

    Ok(ProtocolMessage::new(
        credentials.topic(),
        ChannelEvent::System(SystemEvent::Join),
        serde_json::to_value(&payload)?,
    )
    .with_ref(join_ref.clone())
    .with_join_ref(join_ref))
}

/// What the handshake needs to know about an inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundReply {
    /// Reply status, if one could be located
    pub status: Option<String>,
    /// The frame exactly as received
    pub raw: String,
}

impl InboundReply {
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some(STATUS_OK)
    }
}

/// Reads the reply status out of an inbound frame.
///
/// Accepts a wire tuple (`payload.status`) or a bare object (`status`). Frames that
/// are not JSON fall back to looking for the ok marker in the raw text. An array that
/// is not a well-formed tuple carries no status.
pub fn decode_reply(text: &str) -> InboundReply {
    let status = match serde_json::from_str::<Value>(text) {
        Ok(tuple @ Value::Array(_)) => serde_json::from_value::<ProtocolMessage>(tuple)
            .ok()
            .and_then(|message| message.status().map(str::to_string)),
        Ok(Value::Object(object)) => object
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string),
        Ok(_) => None,
        Err(_) => text
            .contains(STATUS_OK_MARKER)
            .then(|| STATUS_OK.to_string()),
    };

    InboundReply {
        status,
        raw: text.to_string(),
    }
}

use crate::messaging::ChannelEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire layout of the Phoenix V2 serializer: `[join_ref, ref, topic, event, payload]`.
type WireTuple = (Option<String>, Option<String>, String, ChannelEvent, Value);

/// A Phoenix channel message.
///
/// Serializes as a 5-element JSON array rather than an object, which is what the
/// LiveView socket expects once `vsn=2.0.0` is negotiated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "WireTuple", into = "WireTuple")]
pub struct ProtocolMessage {
    pub join_ref: Option<String>,
    pub r#ref: Option<String>,
    pub topic: String,
    pub event: ChannelEvent,
    pub payload: Value,
}

impl ProtocolMessage {
    pub fn new(topic: String, event: ChannelEvent, payload: Value) -> Self {
        Self {
            join_ref: None,
            r#ref: None,
            topic,
            event,
            payload,
        }
    }

    pub fn with_ref(mut self, r#ref: String) -> Self {
        self.r#ref = Some(r#ref);
        self
    }

    pub fn with_join_ref(mut self, join_ref: String) -> Self {
        self.join_ref = Some(join_ref);
        self
    }

    /// The `status` field of the payload, when present.
    pub fn status(&self) -> Option<&str> {
        self.payload.get("status").and_then(Value::as_str)
    }
}

impl From<WireTuple> for ProtocolMessage {
    fn from((join_ref, r#ref, topic, event, payload): WireTuple) -> Self {
        Self {
            join_ref,
            r#ref,
            topic,
            event,
            payload,
        }
    }
}

impl From<ProtocolMessage> for WireTuple {
    fn from(message: ProtocolMessage) -> Self {
        (
            message.join_ref,
            message.r#ref,
            message.topic,
            message.event,
            message.payload,
        )
    }
}

/// Mount parameters sent with the join
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JoinParams {
    #[serde(rename = "_csrf_token")]
    pub csrf_token: String,
    /// Number of times this view has mounted on the socket; 0 for a first join
    #[serde(rename = "_mounts")]
    pub mounts: u32,
}

/// Payload of the `phx_join` sent to a LiveView topic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JoinPayload {
    pub url: String,
    pub params: JoinParams,
    pub session: String,
    #[serde(rename = "static")]
    pub static_data: String,
}

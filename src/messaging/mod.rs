// Messaging module - Phoenix events and wire codec
pub mod codec;
pub mod event;

pub use codec::{InboundReply, decode, decode_reply, encode, join_message};
pub use event::{ChannelEvent, SystemEvent};

pub mod constants;
pub mod error;
pub mod message;

pub use constants::*;
pub use error::{LoadError, Result};
pub use message::{JoinParams, JoinPayload, ProtocolMessage};

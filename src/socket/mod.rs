// Socket module - transport seam between the handshake and a live WebSocket
pub mod connection;
#[cfg(test)]
pub(crate) mod scripted;
pub mod transport;

pub use connection::{TungsteniteConnector, TungsteniteTransport};
pub use transport::{
    ConnectRequest, SocketConnector, SocketError, SocketEvent, SocketTransport, Upgrade,
};

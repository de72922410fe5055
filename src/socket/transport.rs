use crate::types::constants::{LIVE_SOCKET_PATH, VSN};
use crate::types::{LoadError, Result};
use std::future::Future;
use url::Url;

/// Events a socket surfaces to the handshake, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    /// Upgrade completed and the socket is writable
    Open,
    /// Inbound text frame
    Message(String),
    Error(SocketError),
    /// Peer closed the connection, with its close code if one was sent
    Close(Option<u16>),
}

/// A transport-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketError {
    pub description: String,
    local_close: bool,
}

impl SocketError {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            local_close: false,
        }
    }

    /// An error raised as a consequence of this client closing the socket.
    pub fn local_close(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            local_close: true,
        }
    }

    pub fn is_local_close(&self) -> bool {
        self.local_close
    }
}

impl std::fmt::Display for SocketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description)
    }
}

/// Everything needed to open the live socket for one page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub url: Url,
    /// Full `Cookie` header value
    pub cookie: String,
    /// `Origin` header value, matching the page's origin
    pub origin: String,
}

impl ConnectRequest {
    /// Derives `ws(s)://<host>/live/websocket?vsn=2.0.0&_csrf_token=<token>` from a page URL.
    pub fn for_page(page_url: &Url, csrf_token: &str, cookie: impl Into<String>) -> Result<Self> {
        let scheme = match page_url.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => {
                return Err(LoadError::Config(format!(
                    "cannot derive a socket URL from scheme '{}'",
                    other
                )));
            }
        };

        let mut url = page_url.clone();
        url.set_scheme(scheme)
            .map_err(|_| LoadError::Config(format!("cannot switch {} to {}", page_url, scheme)))?;
        url.set_path(LIVE_SOCKET_PATH);
        url.set_query(None);
        url.set_fragment(None);
        url.query_pairs_mut()
            .append_pair("vsn", VSN)
            .append_pair("_csrf_token", csrf_token);

        Ok(Self {
            url,
            cookie: cookie.into(),
            origin: page_url.origin().ascii_serialization(),
        })
    }
}

/// Result of the upgrade request.
///
/// `socket` is only present when the server agreed to switch protocols.
pub struct Upgrade<T> {
    pub status: u16,
    pub socket: Option<T>,
}

/// One open socket, owned by a single handshake.
pub trait SocketTransport: Send {
    /// Waits for the next event. `None` means the stream ended.
    ///
    /// Must be cancel-safe: the handshake races it against its deadline.
    fn next_event(&mut self) -> impl Future<Output = Option<SocketEvent>> + Send;

    fn send(&mut self, frame: String) -> impl Future<Output = Result<()>> + Send;

    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Opens sockets. One connector may serve many page loads but never shares a socket.
pub trait SocketConnector: Send + Sync {
    type Transport: SocketTransport;

    fn connect(
        &self,
        request: &ConnectRequest,
    ) -> impl Future<Output = Result<Upgrade<Self::Transport>>> + Send;
}

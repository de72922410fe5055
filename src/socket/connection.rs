use super::transport::{
    ConnectRequest, SocketConnector, SocketError, SocketEvent, SocketTransport, Upgrade,
};
use crate::types::{LoadError, Result};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::{COOKIE, ORIGIN};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens live sockets over tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

impl SocketConnector for TungsteniteConnector {
    type Transport = TungsteniteTransport;

    async fn connect(&self, request: &ConnectRequest) -> Result<Upgrade<TungsteniteTransport>> {
        let mut ws_request = request.url.as_str().into_client_request()?;
        let headers = ws_request.headers_mut();
        headers.insert(COOKIE, header_value(&request.cookie)?);
        headers.insert(ORIGIN, header_value(&request.origin)?);

        tracing::debug!("Connecting to {}", request.url);

        match connect_async(ws_request).await {
            Ok((stream, response)) => {
                tracing::debug!("Upgrade answered with {}", response.status());
                Ok(Upgrade {
                    status: response.status().as_u16(),
                    socket: Some(TungsteniteTransport::new(stream)),
                })
            }
            // Server answered the upgrade with something other than 101
            Err(WsError::Http(response)) => Ok(Upgrade {
                status: response.status().as_u16(),
                socket: None,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| LoadError::Config(format!("invalid header value: {}", e)))
}

/// A connected WebSocket, split into its halves.
///
/// Reports `Open` once before any frame, mirroring a browser socket's event order.
pub struct TungsteniteTransport {
    writer: SplitSink<WsStream, Message>,
    reader: SplitStream<WsStream>,
    opened: bool,
    closing: bool,
}

impl TungsteniteTransport {
    pub fn new(stream: WsStream) -> Self {
        let (writer, reader) = stream.split();
        Self {
            writer,
            reader,
            opened: false,
            closing: false,
        }
    }
}

fn classify(error: WsError, closing: bool) -> SocketError {
    // Once we have sent our close frame, whatever the stream reports is fallout from it
    if closing || matches!(error, WsError::ConnectionClosed | WsError::AlreadyClosed) {
        SocketError::local_close(error.to_string())
    } else {
        SocketError::new(error.to_string())
    }
}

impl SocketTransport for TungsteniteTransport {
    async fn next_event(&mut self) -> Option<SocketEvent> {
        if !self.opened {
            self.opened = true;
            return Some(SocketEvent::Open);
        }

        loop {
            match self.reader.next().await? {
                Ok(Message::Text(text)) => return Some(SocketEvent::Message(text.to_string())),
                Ok(Message::Close(frame)) => {
                    if let Some(close_frame) = &frame {
                        tracing::debug!(
                            "Server closed connection: code={:?}, reason='{}'",
                            close_frame.code,
                            close_frame.reason
                        );
                    }
                    return Some(SocketEvent::Close(frame.map(|f| u16::from(f.code))));
                }
                Ok(Message::Ping(data)) => {
                    tracing::debug!("Received ping ({} bytes)", data.len());
                }
                Ok(Message::Pong(data)) => {
                    tracing::debug!("Received pong ({} bytes)", data.len());
                }
                Ok(Message::Binary(data)) => {
                    tracing::warn!("Received unexpected binary message ({} bytes)", data.len());
                }
                Ok(Message::Frame(_)) => {
                    tracing::debug!("Received raw frame (internal)");
                }
                Err(e) => return Some(SocketEvent::Error(classify(e, self.closing))),
            }
        }
    }

    async fn send(&mut self, frame: String) -> Result<()> {
        self.writer.send(Message::Text(frame.into())).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.closing = true;
        self.writer.close().await?;
        Ok(())
    }
}

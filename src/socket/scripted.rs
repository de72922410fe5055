//! In-memory sockets that replay a fixed list of events.

use super::transport::{ConnectRequest, SocketConnector, SocketEvent, SocketTransport, Upgrade};
use crate::types::constants::SWITCHING_PROTOCOLS;
use crate::types::Result;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What a scripted socket saw from the client side.
#[derive(Debug, Default)]
pub(crate) struct SocketLog {
    pub requests: Mutex<Vec<ConnectRequest>>,
    pub sent: Mutex<Vec<String>>,
    pub closes: AtomicUsize,
}

impl SocketLog {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<ConnectRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Replays its events, then stays silent forever.
pub(crate) struct ScriptedTransport {
    events: VecDeque<SocketEvent>,
    log: Arc<SocketLog>,
}

impl SocketTransport for ScriptedTransport {
    async fn next_event(&mut self) -> Option<SocketEvent> {
        match self.events.pop_front() {
            Some(event) => Some(event),
            None => std::future::pending().await,
        }
    }

    async fn send(&mut self, frame: String) -> Result<()> {
        self.log.sent.lock().unwrap().push(frame);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out a fresh [`ScriptedTransport`] per connect.
pub(crate) struct ScriptedConnector {
    pub status: u16,
    pub events: Vec<SocketEvent>,
    /// Never complete the upgrade
    pub hang: bool,
    pub log: Arc<SocketLog>,
}

impl ScriptedConnector {
    pub fn new(events: Vec<SocketEvent>) -> Self {
        Self {
            status: SWITCHING_PROTOCOLS,
            events,
            hang: false,
            log: Arc::new(SocketLog::default()),
        }
    }

    /// Open, then answer the join with `reply`.
    pub fn replying(reply: &str) -> Self {
        Self::new(vec![
            SocketEvent::Open,
            SocketEvent::Message(reply.to_string()),
        ])
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }
}

impl SocketConnector for ScriptedConnector {
    type Transport = ScriptedTransport;

    async fn connect(&self, request: &ConnectRequest) -> Result<Upgrade<ScriptedTransport>> {
        self.log.requests.lock().unwrap().push(request.clone());
        if self.hang {
            std::future::pending::<()>().await;
        }

        let socket = (self.status == SWITCHING_PROTOCOLS).then(|| ScriptedTransport {
            events: self.events.clone().into(),
            log: Arc::clone(&self.log),
        });

        Ok(Upgrade {
            status: self.status,
            socket,
        })
    }
}

use super::state::{HandshakeOutcome, HandshakeReport, HandshakeState};
use crate::messaging::codec;
use crate::page::HandshakeCredentials;
use crate::scenario::Check;
use crate::socket::{SocketError, SocketEvent};
use crate::types::constants::SWITCHING_PROTOCOLS;
use std::time::Duration;

/// Side effects the machine asks its driver to perform, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeAction {
    Send(String),
    Close,
}

/// Transition table for one LiveView join.
///
/// The machine never touches a socket itself: each handler consumes one event and
/// returns the actions to perform. Once `Closed`, every handler is a no-op, so the
/// first terminal event wins any race with a late message, error, or timeout.
pub struct HandshakeMachine {
    credentials: HandshakeCredentials,
    page_url: String,
    state: HandshakeState,
    outcome: Option<HandshakeOutcome>,
    detail: Option<String>,
    checks: Vec<Check>,
    ref_counter: u64,
    socket_open: bool,
    close_requested: bool,
    debug: bool,
}

impl HandshakeMachine {
    pub fn new(credentials: HandshakeCredentials, page_url: impl Into<String>) -> Self {
        Self {
            credentials,
            page_url: page_url.into(),
            state: HandshakeState::Idle,
            outcome: None,
            detail: None,
            checks: Vec::new(),
            ref_counter: 0,
            socket_open: false,
            close_requested: false,
            debug: false,
        }
    }

    /// Log frames at info level instead of debug
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn outcome(&self) -> Option<HandshakeOutcome> {
        self.outcome
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub fn topic(&self) -> String {
        self.credentials.topic()
    }

    pub fn is_terminal(&self) -> bool {
        self.state == HandshakeState::Closed
    }

    /// Idle -> Connecting. The caller arms its deadline here.
    pub fn begin(&mut self) {
        if self.state == HandshakeState::Idle {
            self.state = HandshakeState::Connecting;
            tracing::debug!("Connecting socket for {}", self.topic());
        }
    }

    /// The upgrade request was answered with `status`.
    pub fn on_upgrade(&mut self, status: u16) -> Vec<HandshakeAction> {
        if self.state != HandshakeState::Connecting {
            return Vec::new();
        }

        let switched = status == SWITCHING_PROTOCOLS;
        self.record("ws status 101", switched);
        if !switched {
            return self.finish(
                HandshakeOutcome::ConnectFailed,
                format!("upgrade answered with status {}", status),
            );
        }

        self.socket_open = true;
        Vec::new()
    }

    /// The upgrade request itself failed (refused, DNS, TLS, ...).
    pub fn on_connect_error(&mut self, description: &str) -> Vec<HandshakeAction> {
        if self.state != HandshakeState::Connecting {
            return Vec::new();
        }

        self.record("ws status 101", false);
        self.finish(HandshakeOutcome::ConnectFailed, description.to_string())
    }

    pub fn handle(&mut self, event: SocketEvent) -> Vec<HandshakeAction> {
        match event {
            SocketEvent::Open => self.on_open(),
            SocketEvent::Message(text) => self.on_message(&text),
            SocketEvent::Error(error) => self.on_error(&error),
            SocketEvent::Close(code) => self.on_close(code),
        }
    }

    /// Connecting -> AwaitingReply: send the join, the only frame of the handshake.
    pub fn on_open(&mut self) -> Vec<HandshakeAction> {
        if self.state != HandshakeState::Connecting {
            return Vec::new();
        }
        self.socket_open = true;

        let join_ref = self.make_ref();
        let frame = codec::join_message(&self.credentials, &self.page_url, join_ref)
            .and_then(|message| codec::encode(&message));

        match frame {
            Ok(frame) => {
                self.log_frame("Sending", &frame);
                self.state = HandshakeState::AwaitingReply;
                vec![HandshakeAction::Send(frame)]
            }
            Err(e) => self.finish(
                HandshakeOutcome::TransportError,
                format!("could not encode join: {}", e),
            ),
        }
    }

    /// AwaitingReply -> Closed, verified or rejected by the reply status.
    pub fn on_message(&mut self, text: &str) -> Vec<HandshakeAction> {
        match self.state {
            HandshakeState::AwaitingReply => {}
            HandshakeState::Closed => {
                tracing::debug!("Ignoring message after close on {}", self.topic());
                return Vec::new();
            }
            _ => {
                tracing::warn!("Ignoring message before join on {}: {}", self.topic(), text);
                return Vec::new();
            }
        }

        self.log_frame("Received", text);
        let reply = codec::decode_reply(text);
        self.record("join reply received", true);
        self.record("join reply ok", reply.is_ok());

        if reply.is_ok() {
            tracing::debug!("Joined {}", self.topic());
            self.finish(HandshakeOutcome::Verified, String::new())
        } else {
            self.finish(
                HandshakeOutcome::JoinRejected,
                format!("unexpected join reply: {}", reply.raw),
            )
        }
    }

    /// Errors caused by our own close are swallowed; anything else fails the handshake.
    pub fn on_error(&mut self, error: &SocketError) -> Vec<HandshakeAction> {
        if error.is_local_close() {
            tracing::debug!("Ignoring error from our own close: {}", error);
            return Vec::new();
        }
        if self.is_terminal() {
            tracing::debug!("Ignoring error after close on {}: {}", self.topic(), error);
            return Vec::new();
        }

        self.record("no socket error", false);
        self.finish(HandshakeOutcome::TransportError, error.description.clone())
    }

    /// The peer closed before we had a reply.
    pub fn on_close(&mut self, code: Option<u16>) -> Vec<HandshakeAction> {
        self.socket_open = false;
        if self.is_terminal() {
            return Vec::new();
        }

        self.record("join reply received", false);
        let detail = match code {
            Some(code) => format!("socket closed by server with code {} before join reply", code),
            None => "socket closed by server before join reply".to_string(),
        };
        self.finish(HandshakeOutcome::TransportError, detail)
    }

    /// The deadline passed without a terminal event.
    pub fn on_timeout(&mut self, waited: Duration) -> Vec<HandshakeAction> {
        if self.is_terminal() {
            return Vec::new();
        }

        self.record("join reply received", false);
        let phase = match self.state {
            HandshakeState::AwaitingReply => "join reply",
            _ => "socket upgrade",
        };
        self.finish(
            HandshakeOutcome::TimedOut,
            format!("no {} within {}ms", phase, waited.as_millis()),
        )
    }

    pub fn into_report(self) -> HandshakeReport {
        let topic = self.topic();
        let (outcome, detail) = match self.outcome {
            Some(outcome) => (outcome, self.detail),
            None => (
                HandshakeOutcome::TransportError,
                Some(format!("handshake stopped in state {:?}", self.state)),
            ),
        };

        HandshakeReport {
            topic,
            outcome,
            detail,
            checks: self.checks,
        }
    }

    fn finish(&mut self, outcome: HandshakeOutcome, detail: String) -> Vec<HandshakeAction> {
        self.state = HandshakeState::Closed;
        self.outcome = Some(outcome);
        self.detail = (!detail.is_empty()).then_some(detail);

        if outcome.is_success() {
            tracing::debug!("Handshake on {} verified", self.topic());
        } else {
            tracing::warn!(
                "Handshake on {} ended {}: {}",
                self.topic(),
                outcome,
                self.detail.as_deref().unwrap_or_default()
            );
        }

        if self.socket_open && !self.close_requested {
            self.close_requested = true;
            vec![HandshakeAction::Close]
        } else {
            Vec::new()
        }
    }

    fn make_ref(&mut self) -> String {
        self.ref_counter += 1;
        self.ref_counter.to_string()
    }

    fn record(&mut self, name: &str, passed: bool) {
        self.checks.push(Check::new(name, passed));
    }

    fn log_frame(&self, direction: &str, frame: &str) {
        if self.debug {
            tracing::info!("{} on {}: {}", direction, self.topic(), frame);
        } else {
            tracing::debug!("{} on {}: {}", direction, self.topic(), frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK_REPLY: &str = r#"["1","1","lv:phx-42","phx_reply",{"response":{},"status":"ok"}]"#;
    const ERROR_REPLY: &str =
        r#"["1","1","lv:phx-42","phx_reply",{"response":{"reason":"stale"},"status":"error"}]"#;

    fn machine() -> HandshakeMachine {
        HandshakeMachine::new(
            HandshakeCredentials {
                csrf_token: "abc123".to_string(),
                session: "S1".to_string(),
                static_data: "ST1".to_string(),
                element_id: "phx-42".to_string(),
            },
            "http://localhost:4000/profile/settings",
        )
    }

    fn joined() -> HandshakeMachine {
        let mut machine = machine();
        machine.begin();
        machine.on_upgrade(101);
        machine.on_open();
        machine
    }

    fn passed(machine: &HandshakeMachine, name: &str) -> Option<bool> {
        machine
            .checks()
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.passed)
    }

    #[test]
    fn test_open_sends_single_join_frame() {
        let mut machine = machine();
        machine.begin();
        assert_eq!(machine.state(), HandshakeState::Connecting);
        assert!(machine.on_upgrade(101).is_empty());

        let actions = machine.on_open();
        assert_eq!(machine.state(), HandshakeState::AwaitingReply);
        assert_eq!(actions.len(), 1);

        let HandshakeAction::Send(frame) = &actions[0] else {
            panic!("expected a send, got {:?}", actions[0]);
        };
        let message = codec::decode(frame).unwrap();
        assert_eq!(message.topic, "lv:phx-42");
        assert_eq!(message.event.as_str(), "phx_join");
        assert_eq!(message.payload["session"], "S1");
        assert_eq!(message.payload["static"], "ST1");
        assert_eq!(message.payload["params"]["_csrf_token"], "abc123");

        // A second open is not a second join
        assert!(machine.on_open().is_empty());
    }

    #[test]
    fn test_ok_reply_verifies_and_closes_once() {
        let mut machine = joined();

        assert_eq!(machine.on_message(OK_REPLY), vec![HandshakeAction::Close]);
        assert_eq!(machine.state(), HandshakeState::Closed);
        assert_eq!(machine.outcome(), Some(HandshakeOutcome::Verified));
        assert_eq!(passed(&machine, "join reply ok"), Some(true));

        // Late events are not re-evaluated and never close again
        assert!(machine.on_message(ERROR_REPLY).is_empty());
        assert!(machine.on_timeout(Duration::from_secs(2)).is_empty());
        assert!(machine.on_error(&SocketError::new("reset")).is_empty());
        assert_eq!(machine.outcome(), Some(HandshakeOutcome::Verified));
    }

    #[test]
    fn test_bare_ok_object_verifies() {
        let mut machine = joined();
        machine.on_message(r#"{"status":"ok"}"#);
        assert_eq!(machine.outcome(), Some(HandshakeOutcome::Verified));
    }

    #[test]
    fn test_error_reply_is_rejected_with_raw_message() {
        let mut machine = joined();

        assert_eq!(machine.on_message(ERROR_REPLY), vec![HandshakeAction::Close]);
        assert_eq!(machine.outcome(), Some(HandshakeOutcome::JoinRejected));
        assert_eq!(passed(&machine, "join reply ok"), Some(false));

        let report = machine.into_report();
        assert!(report.detail.unwrap().contains(ERROR_REPLY));
    }

    #[test]
    fn test_non_101_upgrade_fails_without_sending() {
        let mut machine = machine();
        machine.begin();

        assert!(machine.on_upgrade(403).is_empty());
        assert_eq!(machine.outcome(), Some(HandshakeOutcome::ConnectFailed));
        assert_eq!(passed(&machine, "ws status 101"), Some(false));
        assert!(machine.on_open().is_empty());
    }

    #[test]
    fn test_connect_error_fails() {
        let mut machine = machine();
        machine.begin();
        assert!(machine.on_connect_error("connection refused").is_empty());
        assert_eq!(machine.outcome(), Some(HandshakeOutcome::ConnectFailed));
    }

    #[test]
    fn test_timeout_while_awaiting_reply() {
        let mut machine = joined();

        assert_eq!(
            machine.on_timeout(Duration::from_millis(2000)),
            vec![HandshakeAction::Close]
        );
        assert_eq!(machine.outcome(), Some(HandshakeOutcome::TimedOut));
        assert_eq!(passed(&machine, "join reply received"), Some(false));

        // A reply racing in after the deadline loses
        assert!(machine.on_message(OK_REPLY).is_empty());
        assert_eq!(machine.outcome(), Some(HandshakeOutcome::TimedOut));
        assert_eq!(
            machine.into_report().detail.as_deref(),
            Some("no join reply within 2000ms")
        );
    }

    #[test]
    fn test_timeout_before_upgrade_has_nothing_to_close() {
        let mut machine = machine();
        machine.begin();
        assert!(machine.on_timeout(Duration::from_secs(2)).is_empty());
        assert_eq!(machine.outcome(), Some(HandshakeOutcome::TimedOut));
    }

    #[test]
    fn test_local_close_error_is_benign() {
        let mut machine = joined();
        assert!(
            machine
                .on_error(&SocketError::local_close("close sent"))
                .is_empty()
        );
        assert_eq!(machine.state(), HandshakeState::AwaitingReply);
        assert_eq!(machine.outcome(), None);
    }

    #[test]
    fn test_other_error_is_transport_error() {
        let mut machine = joined();
        assert_eq!(
            machine.on_error(&SocketError::new("connection reset by peer")),
            vec![HandshakeAction::Close]
        );
        assert_eq!(machine.outcome(), Some(HandshakeOutcome::TransportError));
        assert_eq!(
            machine.into_report().detail.as_deref(),
            Some("connection reset by peer")
        );
    }

    #[test]
    fn test_server_close_before_reply() {
        let mut machine = joined();
        // Socket is already gone, nothing left to close
        assert!(machine.on_close(Some(1011)).is_empty());
        assert_eq!(machine.outcome(), Some(HandshakeOutcome::TransportError));
    }

    #[test]
    fn test_report_of_unfinished_machine() {
        let report = machine().into_report();
        assert_eq!(report.outcome, HandshakeOutcome::TransportError);
        assert_eq!(report.topic, "lv:phx-42");
    }
}

use super::machine::{HandshakeAction, HandshakeMachine};
use super::state::HandshakeReport;
use crate::socket::{ConnectRequest, SocketConnector, SocketError, SocketTransport, Upgrade};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};

/// Runs one handshake to completion.
///
/// The deadline is armed when the machine enters `Connecting` and covers the upgrade
/// as well as the wait for the join reply. Waiting on the next socket event or the
/// deadline is the only suspension point.
pub async fn run_handshake<C: SocketConnector>(
    connector: &C,
    request: &ConnectRequest,
    mut machine: HandshakeMachine,
    timeout: Duration,
) -> HandshakeReport {
    let deadline = Instant::now() + timeout;
    machine.begin();

    let upgrade = tokio::select! {
        result = connector.connect(request) => result,
        _ = sleep_until(deadline) => {
            machine.on_timeout(timeout);
            return machine.into_report();
        }
    };

    let mut socket = match upgrade {
        Ok(Upgrade { status, socket }) => {
            machine.on_upgrade(status);
            match socket {
                Some(socket) if !machine.is_terminal() => socket,
                // Dropping an unwanted socket tears down the TCP stream
                _ => {
                    if !machine.is_terminal() {
                        machine.on_connect_error("upgrade returned no socket");
                    }
                    return machine.into_report();
                }
            }
        }
        Err(e) => {
            machine.on_connect_error(&e.to_string());
            return machine.into_report();
        }
    };

    while !machine.is_terminal() {
        let actions = tokio::select! {
            event = socket.next_event() => match event {
                Some(event) => machine.handle(event),
                None => machine.on_close(None),
            },
            _ = sleep_until(deadline) => machine.on_timeout(timeout),
        };
        perform(&mut machine, &mut socket, actions).await;
    }

    machine.into_report()
}

/// Applies actions in order; failures feed back into the machine.
async fn perform<T: SocketTransport>(
    machine: &mut HandshakeMachine,
    socket: &mut T,
    actions: Vec<HandshakeAction>,
) {
    let mut pending: VecDeque<HandshakeAction> = actions.into();

    while let Some(action) = pending.pop_front() {
        match action {
            HandshakeAction::Send(frame) => {
                if let Err(e) = socket.send(frame).await {
                    pending.extend(machine.on_error(&SocketError::new(e.to_string())));
                }
            }
            HandshakeAction::Close => {
                if let Err(e) = socket.close().await {
                    pending.extend(machine.on_error(&SocketError::local_close(e.to_string())));
                }
            }
        }
    }
}

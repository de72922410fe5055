// Handshake module - drives one live socket from connect to a verified join
pub mod machine;
pub mod runner;
pub mod state;

pub use machine::{HandshakeAction, HandshakeMachine};
pub use runner::run_handshake;
pub use state::{HandshakeOutcome, HandshakeReport, HandshakeState};

//! # LiveView Load
//!
//! A synthetic-load client for Phoenix LiveView. Each virtual user loads a page,
//! scrapes the LiveView credentials it embeds, opens the live socket and verifies
//! that the `phx_join` for the page's view is answered with an `ok` reply.
//!
//! ## Example
//!
//! ```no_run
//! use liveview_load::{
//!     CheckRecorder, Driver, DriverOptions, HttpPageFetcher, ScenarioConfig, ScenarioRunner,
//!     TungsteniteConnector,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(ScenarioConfig::builder("http://localhost:4000", "cookie")?.build()?);
//!
//!     let summary = Driver::new(DriverOptions::default())
//!         .run(|_, recorder: Arc<dyn CheckRecorder>| {
//!             let fetcher = HttpPageFetcher::new(config.cookie_header())?;
//!             Ok(ScenarioRunner::new(config.clone(), fetcher, TungsteniteConnector, recorder))
//!         })
//!         .await?;
//!
//!     assert!(summary.all_passed());
//!     Ok(())
//! }
//! ```

pub mod driver;
pub mod handshake;
pub mod infrastructure;
pub mod messaging;
pub mod page;
pub mod scenario;
pub mod socket;
pub mod types;

pub use driver::{Driver, DriverOptions};
pub use handshake::{HandshakeMachine, HandshakeOutcome, HandshakeReport, run_handshake};
pub use infrastructure::{HttpPageFetcher, PageFetcher, PageResponse};
pub use messaging::{ChannelEvent, SystemEvent};
pub use page::{CredentialError, HandshakeCredentials};
pub use scenario::{
    Check, CheckRecorder, CheckTally, PageStep, ScenarioConfig, ScenarioRunner, TallySnapshot,
};
pub use socket::{SocketConnector, SocketTransport, TungsteniteConnector};
pub use types::{LoadError, ProtocolMessage, Result};

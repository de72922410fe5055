/// Phoenix protocol event strings
pub mod phoenix_events {
    pub const CLOSE: &str = "phx_close";
    pub const ERROR: &str = "phx_error";
    pub const JOIN: &str = "phx_join";
    pub const REPLY: &str = "phx_reply";
    pub const HEARTBEAT: &str = "heartbeat";
}

/// LiveView channel topics are the mount element id behind this prefix
pub const LIVE_TOPIC_PREFIX: &str = "lv:";

/// Path of the LiveView socket endpoint
pub const LIVE_SOCKET_PATH: &str = "/live/websocket";

/// Serializer version negotiated on the socket URL
pub const VSN: &str = "2.0.0";

/// Reply status reported by a successful join
pub const STATUS_OK: &str = "ok";

/// Raw marker checked when a reply does not decode as JSON
pub const STATUS_OK_MARKER: &str = r#""status":"ok""#;

/// HTTP status of a successful WebSocket upgrade
pub const SWITCHING_PROTOCOLS: u16 = 101;

/// Default handshake deadline (milliseconds)
pub const DEFAULT_HANDSHAKE_TIMEOUT: u64 = 2000;

/// Default pause between scenario steps (milliseconds)
pub const DEFAULT_PACE: u64 = 1000;

/// Default target host
pub const DEFAULT_TARGET: &str = "http://localhost:4000";

/// Default session cookie name
pub const DEFAULT_COOKIE_NAME: &str = "_live_beats_key_v1";

use crate::types::constants::{
    DEFAULT_COOKIE_NAME, DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_PACE, DEFAULT_TARGET,
};
use crate::types::{LoadError, Result};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// One page of the journey and what it must contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageStep {
    pub path: String,
    pub expected_status: u16,
    /// Text the body must contain
    pub marker: String,
    pub status_check: String,
    pub marker_check: String,
}

impl PageStep {
    pub fn new(path: impl Into<String>, marker: impl Into<String>) -> Self {
        let marker = marker.into();
        Self {
            path: path.into(),
            expected_status: 200,
            status_check: "status 200".to_string(),
            marker_check: format!("contains {}", marker),
            marker,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self.status_check = format!("status {}", status);
        self
    }

    pub fn with_check_names(
        mut self,
        status_check: impl Into<String>,
        marker_check: impl Into<String>,
    ) -> Self {
        self.status_check = status_check.into();
        self.marker_check = marker_check.into();
        self
    }

    /// The journey of the LiveBeats load script: settings page, then a profile listing.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("/profile/settings", "Profile Settings")
                .with_check_names("status 200", "contains header"),
            Self::new("/glennr", "Artist").with_check_names("songs status 200", "contains table"),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub target: Url,
    pub cookie_name: String,
    pub cookie_value: String,
    pub pages: Vec<PageStep>,
    pub handshake_timeout: Duration,
    /// Pause after every page
    pub pace: Duration,
    /// Log page bodies and socket frames at info level
    pub debug: bool,
}

impl ScenarioConfig {
    pub fn builder(target: &str, cookie_value: impl Into<String>) -> Result<ScenarioConfigBuilder> {
        ScenarioConfigBuilder::new(target, cookie_value)
    }

    /// Reads the configuration from the process environment.
    ///
    /// `LIVEBEATS_COOKIE` is required. `LOAD_TARGET`, `LOAD_COOKIE_NAME`,
    /// `LOAD_TIMEOUT_MS`, `LOAD_PACE_MS` and `LOAD_DEBUG` are optional. `LOAD_DEBUG` accepts
    /// `1`/`0`, `true`/`false`, `yes`/`no` and `on`/`off`.
    pub fn from_env() -> Result<Self> {
        let cookie = std::env::var("LIVEBEATS_COOKIE")
            .map_err(|_| LoadError::Config("LIVEBEATS_COOKIE is not set".to_string()))?;
        let target = std::env::var("LOAD_TARGET").unwrap_or_else(|_| DEFAULT_TARGET.to_string());

        let mut builder = ScenarioConfigBuilder::new(&target, cookie)?
            .handshake_timeout(Duration::from_millis(env_or(
                "LOAD_TIMEOUT_MS",
                DEFAULT_HANDSHAKE_TIMEOUT,
            )?))
            .pace(Duration::from_millis(env_or("LOAD_PACE_MS", DEFAULT_PACE)?))
            .debug(env_flag("LOAD_DEBUG", false)?);

        if let Ok(name) = std::env::var("LOAD_COOKIE_NAME") {
            builder = builder.cookie_name(name);
        }

        builder.build()
    }

    /// `Cookie` header value carrying the session
    pub fn cookie_header(&self) -> String {
        format!("{}={}", self.cookie_name, self.cookie_value)
    }

    pub fn page_url(&self, step: &PageStep) -> Result<Url> {
        Ok(self.target.join(&step.path)?)
    }
}

/// Parses an optional environment variable, falling back to `default` when unset.
pub(crate) fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| LoadError::Config(format!("{} has invalid value '{}': {}", key, raw, e))),
        Err(_) => Ok(default),
    }
}

/// Like [`env_or`], for on/off switches.
pub(crate) fn env_flag(key: &str, default: bool) -> Result<bool> {
    match std::env::var(key) {
        Ok(raw) => parse_flag(&raw).ok_or_else(|| {
            LoadError::Config(format!("{} has invalid value '{}': expected a flag", key, raw))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Builder for ScenarioConfig that validates its inputs
pub struct ScenarioConfigBuilder {
    config: ScenarioConfig,
}

impl ScenarioConfigBuilder {
    pub fn new(target: &str, cookie_value: impl Into<String>) -> Result<Self> {
        let cookie_value = cookie_value.into();

        // Validate session cookie is provided
        if cookie_value.is_empty() {
            return Err(LoadError::Config("session cookie is required".to_string()));
        }

        Ok(Self {
            config: ScenarioConfig {
                target: Url::parse(target)?,
                cookie_name: DEFAULT_COOKIE_NAME.to_string(),
                cookie_value,
                pages: PageStep::defaults(),
                handshake_timeout: Duration::from_millis(DEFAULT_HANDSHAKE_TIMEOUT),
                pace: Duration::from_millis(DEFAULT_PACE),
                debug: false,
            },
        })
    }

    pub fn cookie_name(mut self, name: impl Into<String>) -> Self {
        self.config.cookie_name = name.into();
        self
    }

    pub fn pages(mut self, pages: Vec<PageStep>) -> Self {
        self.config.pages = pages;
        self
    }

    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    pub fn pace(mut self, pace: Duration) -> Self {
        self.config.pace = pace;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    pub fn build(self) -> Result<ScenarioConfig> {
        if self.config.pages.is_empty() {
            return Err(LoadError::Config("at least one page is required".to_string()));
        }
        if self.config.cookie_name.is_empty() {
            return Err(LoadError::Config("cookie name is required".to_string()));
        }
        if self.config.handshake_timeout.is_zero() {
            return Err(LoadError::Config("handshake timeout must be positive".to_string()));
        }
        Ok(self.config)
    }
}

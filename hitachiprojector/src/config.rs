use std::time::Duration;

/// TCP port of the projector's binary command interface.
pub const DEFAULT_PORT: u16 = 23;
pub const DEFAULT_PJLINK_PORT: u16 = 4352;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
/// Every new connection to a projector without authentication waits this long
/// before its first frame. Per-call connections pay it on every query, a
/// `keep_alive` session only when it connects.
pub const DEFAULT_CHALLENGE_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectorConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    /// Bound on connecting and on each command round trip.
    pub timeout: Duration,
    /// How long to wait for an authentication challenge after connecting.
    /// A projector with authentication disabled sends nothing. A challenge
    /// arriving later is read as the reply and fails as
    /// [`Error::UnknownReply`](crate::Error::UnknownReply).
    pub challenge_timeout: Duration,
    /// Keep the socket open between calls instead of reconnecting each time.
    pub keep_alive: bool,
}

impl ProjectorConfig {
    pub fn new(host: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            password: password.into(),
            timeout: DEFAULT_TIMEOUT,
            challenge_timeout: DEFAULT_CHALLENGE_TIMEOUT,
            keep_alive: false,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_challenge_timeout(mut self, timeout: Duration) -> Self {
        self.challenge_timeout = timeout;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// PJLink settings for the same projector and password.
    pub fn pjlink(&self) -> PjlinkConfig {
        PjlinkConfig {
            host: self.host.clone(),
            port: DEFAULT_PJLINK_PORT,
            password: self.password.clone(),
            timeout: self.timeout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PjlinkConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    pub timeout: Duration,
}

impl PjlinkConfig {
    pub fn new(host: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PJLINK_PORT,
            password: password.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

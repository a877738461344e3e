//! Client for the network control protocol of Hitachi projectors.
//!
//! [`ProjectorConnection`] sends the binary command frames of the projector's
//! TCP control port and classifies each reply as a [`ReplyType`]. Accessors
//! decode `DATA` replies into the status enums of [`status`]. The projector's
//! descriptive metadata is read over PJLink with [`PjlinkConnection`].

use std::future::Future;
use std::time::Duration;

pub mod auth;
pub mod command;
pub mod config;
pub mod connection;
pub mod pjlink;
pub mod reply;
pub mod status;

pub use command::{Command, CommandTable, COMMANDS};
pub use config::{PjlinkConfig, ProjectorConfig};
pub use connection::ProjectorConnection;
pub use pjlink::{DeviceInfo, PjlinkConnection, PjlinkError};
pub use reply::{Reply, ReplyType};
pub use status::{
    AutoEcoModeStatus, BlankStatus, EcoModeStatus, ErrorStatus, InputSource, PowerStatus,
};

/// Result of an accessor: the reply classification, plus the decoded value
/// when the reply was `DATA`.
pub type Query<T> = Result<(ReplyType, Option<T>), Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[error("connection closed by projector")]
    ConnectionClosed,

    #[error("unrecognized reply header 0x{0:02x}")]
    UnknownReply(u8),
    #[error("unmapped {kind} value 0x{value:04x}")]
    UnmappedValue { kind: &'static str, value: u16 },
    #[error("incomplete authentication challenge ({0} bytes)")]
    MalformedChallenge(usize),
    #[error("malformed PJLink response: {0:?}")]
    PjlinkProtocol(String),

    #[error("unexpected reply type: expected {expected}, got {actual}")]
    UnexpectedReplyType {
        expected: ReplyType,
        actual: ReplyType,
    },

    #[error("authentication rejected")]
    AuthRejected,
    #[error("PJLink error: {0}")]
    Pjlink(PjlinkError),
}

impl Error {
    /// The projector could not be reached or stopped answering.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Timeout(_) | Error::ConnectionClosed
        )
    }

    /// The projector answered with bytes that do not fit the protocol.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            Error::UnknownReply(_)
                | Error::UnmappedValue { .. }
                | Error::MalformedChallenge(_)
                | Error::PjlinkProtocol(_)
        )
    }
}

/// Bounds `fut` by `duration`, reporting expiry as [`Error::Timeout`].
pub(crate) async fn within<T, F>(duration: Duration, fut: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    tokio::time::timeout(duration, fut)
        .await
        .map_err(|_| Error::Timeout(duration))?
}

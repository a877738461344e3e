pub mod handler;
pub mod state;

pub use handler::Handler;
pub use state::{MediaPlayerState, ProjectorState};

pub const DEFAULT_SOCKET: &str = "/run/projectord/socket";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Projector(#[from] hitachiprojector::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid projector password")]
    InvalidAuth,
    #[error("projector answered {0} to the power query")]
    CannotConnect(hitachiprojector::ReplyType),
    #[error("unknown input source {0:?}")]
    UnknownSource(String),
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize, clap::ValueEnum,
)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize, clap::Subcommand)]
pub enum Command {
    /// Poll the projector and print its state
    Status,
    TurnOn,
    TurnOff,
    /// Switch input, e.g. `HDMI` or `ComputerIn1`
    SelectSource {
        source: String,
    },
    Blank {
        state: Toggle,
    },
    EcoMode {
        state: Toggle,
    },
    AutoEcoMode {
        state: Toggle,
    },
    ResetFilterTime,
    ResetLampTime,
    /// Name, manufacturer and model, read over PJLink
    Info,
}

#[derive(Debug, serde::Deserialize, serde::Serialize, clap::Parser)]
pub struct SocketPayload {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum Response {
    Done,
    State(ProjectorState),
    Info(hitachiprojector::DeviceInfo),
    Error(String),
}

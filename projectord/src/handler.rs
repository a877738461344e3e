use hitachiprojector::{
    Command as ProjectorCommand, PjlinkConfig, PjlinkConnection, ProjectorConnection, ReplyType,
};

use crate::state::{self, ProjectorState};
use crate::{Command, Error, Response, Toggle};

/// Executes client requests against one projector.
pub struct Handler {
    con: ProjectorConnection,
    pjlink: PjlinkConfig,
}

impl Handler {
    pub fn new(con: ProjectorConnection, pjlink: PjlinkConfig) -> Self {
        Self { con, pjlink }
    }

    pub fn connection(&self) -> &ProjectorConnection {
        &self.con
    }

    /// Checks host and password by reading the power status. A `DATA` reply
    /// means both are good.
    pub async fn check(&self) -> Result<(), Error> {
        let (reply_type, _) = self.con.get_power_status().await?;
        match reply_type {
            ReplyType::Data => Ok(()),
            ReplyType::Auth => Err(Error::InvalidAuth),
            other => Err(Error::CannotConnect(other)),
        }
    }

    pub async fn handle(&self, cmd: &Command) -> Response {
        match self.execute(cmd).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(?cmd, "request failed: {}", e);
                Response::Error(e.to_string())
            }
        }
    }

    async fn execute(&self, cmd: &Command) -> Result<Response, Error> {
        let command = match cmd {
            Command::Status => return Ok(Response::State(ProjectorState::poll(&self.con).await)),
            Command::Info => return self.info().await,

            Command::TurnOn => ProjectorCommand::PowerTurnOn,
            Command::TurnOff => ProjectorCommand::PowerTurnOff,
            Command::SelectSource { source } => state::source_command(source)
                .ok_or_else(|| Error::UnknownSource(source.clone()))?,
            Command::Blank { state } => match state {
                Toggle::On => ProjectorCommand::BlankOn,
                Toggle::Off => ProjectorCommand::BlankOff,
            },
            Command::EcoMode { state } => match state {
                Toggle::On => ProjectorCommand::EcoModeEco,
                Toggle::Off => ProjectorCommand::EcoModeNormal,
            },
            Command::AutoEcoMode { state } => match state {
                Toggle::On => ProjectorCommand::AutoEcoModeOn,
                Toggle::Off => ProjectorCommand::AutoEcoModeOff,
            },
            Command::ResetFilterTime => ProjectorCommand::FilterTimeReset,
            Command::ResetLampTime => ProjectorCommand::LampTimeReset,
        };

        let (reply_type, _) = self.con.send_cmd(command).await?;
        reply_type.expect(ReplyType::Ack)?;
        tracing::info!(?command, "done");
        Ok(Response::Done)
    }

    async fn info(&self) -> Result<Response, Error> {
        let mut pjlink = PjlinkConnection::connect(&self.pjlink).await?;
        let info = pjlink.device_info().await?;
        pjlink.close().await?;
        Ok(Response::Info(info))
    }
}

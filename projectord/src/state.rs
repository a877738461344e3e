//! Snapshot of everything the daemon reports about the projector.

use hitachiprojector::{
    Command, ErrorStatus, InputSource, PowerStatus, ProjectorConnection, Query, ReplyType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum MediaPlayerState {
    On,
    Off,
}

impl From<PowerStatus> for MediaPlayerState {
    fn from(status: PowerStatus) -> Self {
        match status {
            PowerStatus::On => MediaPlayerState::On,
            PowerStatus::Off | PowerStatus::CoolDown => MediaPlayerState::Off,
        }
    }
}

impl MediaPlayerState {
    pub fn icon(self) -> &'static str {
        match self {
            MediaPlayerState::On => "mdi:projector",
            MediaPlayerState::Off => "mdi:projector-off",
        }
    }
}

impl std::fmt::Display for MediaPlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaPlayerState::On => f.write_str("on"),
            MediaPlayerState::Off => f.write_str("off"),
        }
    }
}

pub const ERROR_STATUS_OPTIONS: [&str; 8] = [
    "normal", "cover", "fan", "lamp", "temp", "airflow", "cold", "filter",
];

pub fn error_status_option(status: ErrorStatus) -> &'static str {
    match status {
        ErrorStatus::Normal => "normal",
        ErrorStatus::Cover => "cover",
        ErrorStatus::Fan => "fan",
        ErrorStatus::Lamp => "lamp",
        ErrorStatus::Temp => "temp",
        ErrorStatus::AirFlow => "airflow",
        ErrorStatus::Cold => "cold",
        ErrorStatus::Filter => "filter",
    }
}

/// Names accepted by `select-source`, one per selectable input.
pub fn source_list() -> Vec<&'static str> {
    InputSource::ALL.iter().map(|s| s.name()).collect()
}

pub fn source_command(name: &str) -> Option<Command> {
    InputSource::from_name(name).map(InputSource::set_command)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct ProjectorState {
    /// False when the projector could not be reached at all.
    pub available: bool,
    pub state: Option<MediaPlayerState>,
    pub source: Option<String>,
    pub blank: Option<bool>,
    pub eco_mode: Option<bool>,
    pub auto_eco_mode: Option<bool>,
    pub lamp_hours: Option<u32>,
    pub filter_hours: Option<u32>,
    pub error: Option<String>,
}

impl ProjectorState {
    /// Queries every entity in turn. Values the projector does not answer
    /// with `DATA` are left empty.
    pub async fn poll(con: &ProjectorConnection) -> Self {
        let power = con.get_power_status().await;
        if let Err(e) = &power {
            if e.is_transport() {
                tracing::warn!(host = con.host(), "projector unavailable: {}", e);
                return Self::default();
            }
        }

        Self {
            available: true,
            state: value("power", power).map(MediaPlayerState::from),
            source: value("input source", con.get_input_source().await)
                .map(|s| s.name().to_string()),
            blank: value("blank", con.get_blank_status().await)
                .map(|s| s == hitachiprojector::BlankStatus::On),
            eco_mode: value("eco mode", con.get_eco_mode_status().await)
                .map(|s| s == hitachiprojector::EcoModeStatus::Eco),
            auto_eco_mode: value("auto eco mode", con.get_auto_eco_mode_status().await)
                .map(|s| s == hitachiprojector::AutoEcoModeStatus::On),
            lamp_hours: value("lamp time", con.get_lamp_time().await),
            filter_hours: value("filter time", con.get_filter_time().await),
            error: value("error status", con.get_error_status().await)
                .map(|s| error_status_option(s).to_string()),
        }
    }

    pub fn icon(&self) -> &'static str {
        self.state.unwrap_or(MediaPlayerState::Off).icon()
    }
}

fn value<T>(entity: &'static str, result: Query<T>) -> Option<T> {
    match result {
        Ok((ReplyType::Data, Some(value))) => Some(value),
        Ok((reply_type, _)) => {
            tracing::warn!(entity, %reply_type, "unexpected reply type");
            None
        }
        Err(e) => {
            tracing::warn!(entity, "{}", e);
            None
        }
    }
}

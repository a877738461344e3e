use crate::InputSource;

pub const HEADER: [u8; 5] = [0xbe, 0xef, 0x03, 0x06, 0x00];
pub const FRAME_LEN: usize = 13;

const CRC_INIT: u16 = 0x1c17;
const CRC_POLY: u16 = 0xa001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Action {
    Set = 0x0001,
    Get = 0x0002,
    Increment = 0x0004,
    Decrement = 0x0005,
    Execute = 0x0006,
}

pub const POWER: u16 = 0x6000;
pub const INPUT_SOURCE: u16 = 0x2000;
pub const ERROR_STATUS: u16 = 0x6020;
pub const LAMP_TIME_HIGH: u16 = 0x1090;
pub const LAMP_TIME_LOW: u16 = 0x109e;
pub const LAMP_TIME_RESET: u16 = 0x7030;
pub const FILTER_TIME_HIGH: u16 = 0x10a0;
pub const FILTER_TIME_LOW: u16 = 0x10ae;
pub const FILTER_TIME_RESET: u16 = 0x7040;
pub const BLANK: u16 = 0x3020;
pub const ECO_MODE: u16 = 0x3300;
pub const AUTO_ECO_MODE: u16 = 0x3310;

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
pub enum Command {
    PowerTurnOff,
    PowerTurnOn,
    PowerGet,
    InputSourceComputerIn1,
    InputSourceComputerIn2,
    InputSourceHDMI,
    InputSourceComponent,
    InputSourceSVideo,
    InputSourceVideo,
    InputSourceUSBTypeA,
    InputSourceLAN,
    InputSourceGet,
    ErrorStatusGet,
    LampTimeHighGet,
    LampTimeLowGet,
    LampTimeReset,
    FilterTimeHighGet,
    FilterTimeLowGet,
    FilterTimeReset,
    BlankOff,
    BlankOn,
    BlankGet,
    EcoModeNormal,
    EcoModeEco,
    EcoModeGet,
    AutoEcoModeOff,
    AutoEcoModeOn,
    AutoEcoModeGet,
}

impl Command {
    pub const COUNT: usize = 28;

    /// All commands, in declaration order.
    pub const ALL: [Command; Command::COUNT] = [
        Command::PowerTurnOff,
        Command::PowerTurnOn,
        Command::PowerGet,
        Command::InputSourceComputerIn1,
        Command::InputSourceComputerIn2,
        Command::InputSourceHDMI,
        Command::InputSourceComponent,
        Command::InputSourceSVideo,
        Command::InputSourceVideo,
        Command::InputSourceUSBTypeA,
        Command::InputSourceLAN,
        Command::InputSourceGet,
        Command::ErrorStatusGet,
        Command::LampTimeHighGet,
        Command::LampTimeLowGet,
        Command::LampTimeReset,
        Command::FilterTimeHighGet,
        Command::FilterTimeLowGet,
        Command::FilterTimeReset,
        Command::BlankOff,
        Command::BlankOn,
        Command::BlankGet,
        Command::EcoModeNormal,
        Command::EcoModeEco,
        Command::EcoModeGet,
        Command::AutoEcoModeOff,
        Command::AutoEcoModeOn,
        Command::AutoEcoModeGet,
    ];

    /// The (action, type, setting) triple this command is encoded from.
    pub const fn parts(self) -> (Action, u16, u16) {
        match self {
            Command::PowerTurnOff => (Action::Set, POWER, 0x0000),
            Command::PowerTurnOn => (Action::Set, POWER, 0x0001),
            Command::PowerGet => (Action::Get, POWER, 0x0000),
            Command::InputSourceComputerIn1 => source(InputSource::ComputerIn1),
            Command::InputSourceComputerIn2 => source(InputSource::ComputerIn2),
            Command::InputSourceHDMI => source(InputSource::HDMI),
            Command::InputSourceComponent => source(InputSource::Component),
            Command::InputSourceSVideo => source(InputSource::SVideo),
            Command::InputSourceVideo => source(InputSource::Video),
            Command::InputSourceUSBTypeA => source(InputSource::USBTypeA),
            Command::InputSourceLAN => source(InputSource::LAN),
            Command::InputSourceGet => (Action::Get, INPUT_SOURCE, 0x0000),
            Command::ErrorStatusGet => (Action::Get, ERROR_STATUS, 0x0000),
            Command::LampTimeHighGet => (Action::Get, LAMP_TIME_HIGH, 0x0000),
            Command::LampTimeLowGet => (Action::Get, LAMP_TIME_LOW, 0x0000),
            Command::LampTimeReset => (Action::Execute, LAMP_TIME_RESET, 0x0000),
            Command::FilterTimeHighGet => (Action::Get, FILTER_TIME_HIGH, 0x0000),
            Command::FilterTimeLowGet => (Action::Get, FILTER_TIME_LOW, 0x0000),
            Command::FilterTimeReset => (Action::Execute, FILTER_TIME_RESET, 0x0000),
            Command::BlankOff => (Action::Set, BLANK, 0x0000),
            Command::BlankOn => (Action::Set, BLANK, 0x0001),
            Command::BlankGet => (Action::Get, BLANK, 0x0000),
            Command::EcoModeNormal => (Action::Set, ECO_MODE, 0x0000),
            Command::EcoModeEco => (Action::Set, ECO_MODE, 0x0001),
            Command::EcoModeGet => (Action::Get, ECO_MODE, 0x0000),
            Command::AutoEcoModeOff => (Action::Set, AUTO_ECO_MODE, 0x0000),
            Command::AutoEcoModeOn => (Action::Set, AUTO_ECO_MODE, 0x0001),
            Command::AutoEcoModeGet => (Action::Get, AUTO_ECO_MODE, 0x0000),
        }
    }

    pub fn frame(self) -> &'static [u8; FRAME_LEN] {
        COMMANDS.encode(self)
    }
}

const fn source(source: InputSource) -> (Action, u16, u16) {
    (Action::Set, INPUT_SOURCE, source.wire_value())
}

/// Precomputed wire frames for every [`Command`].
pub struct CommandTable {
    frames: [[u8; FRAME_LEN]; Command::COUNT],
}

impl CommandTable {
    const fn new() -> Self {
        let mut frames = [[0; FRAME_LEN]; Command::COUNT];
        let mut i = 0;
        while i < Command::COUNT {
            let (action, kind, setting) = Command::ALL[i].parts();
            frames[i] = encode(action, kind, setting);
            i += 1;
        }
        Self { frames }
    }

    pub fn encode(&self, command: Command) -> &[u8; FRAME_LEN] {
        &self.frames[command as usize]
    }
}

pub static COMMANDS: CommandTable = CommandTable::new();

pub const fn encode(action: Action, kind: u16, setting: u16) -> [u8; FRAME_LEN] {
    let a = (action as u16).to_le_bytes();
    let k = kind.to_le_bytes();
    let s = setting.to_le_bytes();
    let body = [a[0], a[1], k[0], k[1], s[0], s[1]];
    let crc = crc16(&body).to_be_bytes();

    [
        HEADER[0], HEADER[1], HEADER[2], HEADER[3], HEADER[4], crc[0], crc[1], body[0], body[1],
        body[2], body[3], body[4], body[5],
    ]
}

pub const fn crc16(data: &[u8]) -> u16 {
    let mut crc = CRC_INIT;
    let mut i = 0;
    while i < data.len() {
        crc ^= data[i] as u16;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ CRC_POLY
            } else {
                crc >> 1
            };
            bit += 1;
        }
        i += 1;
    }
    crc
}

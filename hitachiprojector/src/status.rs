use crate::{Command, Error};

/// Declares a status enum together with its 16-bit wire value mapping.
///
/// Decoding an unlisted value fails with [`Error::UnmappedValue`]; there is no
/// fallback variant.
macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const fn wire_value(self) -> u16 {
                match self {
                    $($name::$variant => $value),+
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.name() == name)
            }
        }

        impl TryFrom<u16> for $name {
            type Error = Error;

            fn try_from(value: u16) -> Result<Self, Error> {
                match value {
                    $($value => Ok($name::$variant),)+
                    _ => Err(Error::UnmappedValue {
                        kind: stringify!($name),
                        value,
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

status_enum!(PowerStatus {
    Off = 0x0000,
    On = 0x0001,
    CoolDown = 0x0002,
});

status_enum!(
    #[allow(clippy::upper_case_acronyms)]
    InputSource {
        ComputerIn1 = 0x0000,
        Video = 0x0001,
        SVideo = 0x0002,
        HDMI = 0x0003,
        ComputerIn2 = 0x0004,
        Component = 0x0005,
        USBTypeA = 0x0006,
        LAN = 0x000b,
    }
);

status_enum!(BlankStatus {
    Off = 0x0000,
    On = 0x0001,
});

status_enum!(EcoModeStatus {
    Normal = 0x0000,
    Eco = 0x0001,
});

status_enum!(AutoEcoModeStatus {
    Off = 0x0000,
    On = 0x0001,
});

status_enum!(
    /// Value of the projector's error status register. `0x0006` is not
    /// assigned by the device.
    ErrorStatus {
        Normal = 0x0000,
        Cover = 0x0001,
        Fan = 0x0002,
        Lamp = 0x0003,
        Temp = 0x0004,
        AirFlow = 0x0005,
        Cold = 0x0007,
        Filter = 0x0008,
    }
);

impl InputSource {
    /// The command that switches the projector to this source.
    pub const fn set_command(self) -> Command {
        match self {
            InputSource::ComputerIn1 => Command::InputSourceComputerIn1,
            InputSource::ComputerIn2 => Command::InputSourceComputerIn2,
            InputSource::HDMI => Command::InputSourceHDMI,
            InputSource::Component => Command::InputSourceComponent,
            InputSource::SVideo => Command::InputSourceSVideo,
            InputSource::Video => Command::InputSourceVideo,
            InputSource::USBTypeA => Command::InputSourceUSBTypeA,
            InputSource::LAN => Command::InputSourceLAN,
        }
    }
}

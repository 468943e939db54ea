use std::str::FromStr;

use aprskiss_kiss::{FULL_DUPLEX, PERSISTENCE, SLOT_TIME, TX_DELAY, TX_TAIL};

use crate::error::SessionError;

/// Switches W8DED host-mode firmware into KISS mode.
pub const MODE_INIT_W8DED: [u8; 5] = [0x0D, 0x1B, 0x40, 0x4B, 0x0D];

/// LINK>.<NORD firmware accepts the W8DED sequence.
pub const MODE_INIT_LINKNORD: [u8; 5] = MODE_INIT_W8DED;

/// Leaves KISS mode: a `RETURN` command frame followed by CR.
pub const MODE_END: [u8; 4] = [0xC0, 0xFF, 0xC0, 0x0D];

/// Byte sequence sent right after the link opens to enter KISS mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ModeInit {
    /// The TNC already speaks KISS.
    #[default]
    None,
    W8ded,
    LinkNord,
    Custom(Vec<u8>),
}

impl ModeInit {
    /// The bytes to send, if any.
    pub fn sequence(&self) -> Option<&[u8]> {
        match self {
            Self::None => None,
            Self::W8ded => Some(&MODE_INIT_W8DED[..]),
            Self::LinkNord => Some(&MODE_INIT_LINKNORD[..]),
            Self::Custom(bytes) if bytes.is_empty() => None,
            Self::Custom(bytes) => Some(bytes.as_slice()),
        }
    }
}

impl FromStr for ModeInit {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "w8ded" => Ok(Self::W8ded),
            "linknord" => Ok(Self::LinkNord),
            _ => Err(SessionError::UnknownModeInit(s.to_string())),
        }
    }
}

/// KISS channel-access parameters written when a session opens.
///
/// Unset fields are left at whatever the TNC currently uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KissSettings {
    /// Keyup delay, 10 ms units.
    pub tx_delay: Option<u8>,
    pub persistence: Option<u8>,
    /// Slot interval, 10 ms units.
    pub slot_time: Option<u8>,
    /// Transmitter hold after the frame, 10 ms units.
    pub tx_tail: Option<u8>,
    pub full_duplex: Option<u8>,
}

impl KissSettings {
    /// The values Xastir applies: 400 ms TXDELAY, p = 0.25, 200 ms slot,
    /// 300 ms tail, half duplex.
    pub fn xastir() -> Self {
        Self {
            tx_delay: Some(40),
            persistence: Some(63),
            slot_time: Some(20),
            tx_tail: Some(30),
            full_duplex: Some(0),
        }
    }

    /// `(command, value)` pairs for every set field, in command-code order.
    pub fn commands(&self) -> Vec<(u8, u8)> {
        [
            (TX_DELAY, self.tx_delay),
            (PERSISTENCE, self.persistence),
            (SLOT_TIME, self.slot_time),
            (TX_TAIL, self.tx_tail),
            (FULL_DUPLEX, self.full_duplex),
        ]
        .into_iter()
        .filter_map(|(command, value)| value.map(|v| (command, v)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.commands().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_share_sequence() {
        assert_eq!(ModeInit::W8ded.sequence(), Some(&[13, 27, 64, 75, 13][..]));
        assert_eq!(ModeInit::LinkNord.sequence(), ModeInit::W8ded.sequence());
        assert_eq!(ModeInit::None.sequence(), None);
        assert_eq!(ModeInit::Custom(Vec::new()).sequence(), None);
        assert_eq!(ModeInit::Custom(vec![1, 2]).sequence(), Some(&[1, 2][..]));
    }

    #[test]
    fn parse_preset_names() {
        assert_eq!("none".parse::<ModeInit>().unwrap(), ModeInit::None);
        assert_eq!("W8DED".parse::<ModeInit>().unwrap(), ModeInit::W8ded);
        assert_eq!("linknord".parse::<ModeInit>().unwrap(), ModeInit::LinkNord);
        assert!(matches!(
            "tapr".parse::<ModeInit>(),
            Err(SessionError::UnknownModeInit(name)) if name == "tapr"
        ));
    }

    #[test]
    fn default_settings_send_nothing() {
        assert!(KissSettings::default().is_empty());
    }

    #[test]
    fn xastir_commands_in_order() {
        assert_eq!(
            KissSettings::xastir().commands(),
            vec![
                (TX_DELAY, 40),
                (PERSISTENCE, 63),
                (SLOT_TIME, 20),
                (TX_TAIL, 30),
                (FULL_DUPLEX, 0)
            ]
        );
    }

    #[test]
    fn partial_settings() {
        let settings = KissSettings {
            tx_delay: Some(25),
            ..KissSettings::default()
        };
        assert_eq!(settings.commands(), vec![(TX_DELAY, 25)]);
    }
}

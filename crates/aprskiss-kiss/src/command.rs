//! KISS command codes.
//!
//! The first byte of every frame selects what the TNC does with the rest.
//! Only [`DATA_FRAME`] carries AX.25 traffic; the others set channel-access
//! parameters. See <http://www.ax25.net/kiss.aspx>.

/// AX.25 frame to transmit or that was received.
pub const DATA_FRAME: u8 = 0x00;

/// Keyup delay in 10 ms units.
pub const TX_DELAY: u8 = 0x01;

/// Persistence parameter for p-persistent CSMA.
pub const PERSISTENCE: u8 = 0x02;

/// Slot interval in 10 ms units.
pub const SLOT_TIME: u8 = 0x03;

/// Time to hold up the transmitter after the frame, in 10 ms units.
pub const TX_TAIL: u8 = 0x04;

/// Nonzero selects full duplex.
pub const FULL_DUPLEX: u8 = 0x05;

/// Hardware-specific setting.
pub const SET_HARDWARE: u8 = 0x06;

/// Leave KISS mode.
pub const RETURN: u8 = 0xFF;

/// Returns a human-readable name for a command byte.
pub fn command_name(command: u8) -> &'static str {
    match command {
        DATA_FRAME => "DATA_FRAME",
        TX_DELAY => "TX_DELAY",
        PERSISTENCE => "PERSISTENCE",
        SLOT_TIME => "SLOT_TIME",
        TX_TAIL => "TX_TAIL",
        FULL_DUPLEX => "FULL_DUPLEX",
        SET_HARDWARE => "SET_HARDWARE",
        RETURN => "RETURN",
        _ => "UNKNOWN",
    }
}

/// Returns true if the command sets a channel-access parameter.
pub fn is_parameter(command: u8) -> bool {
    (TX_DELAY..=SET_HARDWARE).contains(&command)
}

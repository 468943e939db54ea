/// Errors raised while building or parsing AX.25/APRS values.
#[derive(Debug, thiserror::Error)]
pub enum Ax25Error {
    /// The callsign base is not 2 to 6 letters or digits.
    #[error("invalid callsign {callsign:?}: {reason}")]
    InvalidCallsign {
        callsign: String,
        reason: &'static str,
    },

    /// The SSID is not a number in 0..=15.
    #[error("invalid ssid {0:?}: expected 0-15")]
    InvalidSsid(String),

    /// The path is longer than the AX.25 address field allows.
    #[error("path has {hops} hops, max {max}")]
    TooManyHops { hops: usize, max: usize },

    /// A TNC2 text line could not be parsed.
    #[error("invalid TNC2 frame: {reason}")]
    InvalidTnc2 { reason: String },

    /// A coordinate is not finite or lies outside its range.
    #[error("coordinate {value} out of range (max {max} degrees)")]
    CoordinateOutOfRange { value: f64, max: f64 },
}

pub type Result<T> = std::result::Result<T, Ax25Error>;

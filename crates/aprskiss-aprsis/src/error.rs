/// Errors that can occur while talking to APRS-IS.
#[derive(Debug, thiserror::Error)]
pub enum AprsIsError {
    /// A TCP operation was attempted before `connect`.
    #[error("not connected to APRS-IS")]
    NotConnected,

    /// Resolving or connecting to the server failed.
    #[error("transport error: {0}")]
    Transport(#[from] aprskiss_transport::TransportError),

    /// An I/O error occurred on the connection.
    #[error("APRS-IS I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server closed the connection.
    #[error("connection closed by server")]
    ConnectionClosed,

    /// Reconnecting after a dropped connection kept failing.
    #[error("send failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<AprsIsError>,
    },

    /// The HTTP submission could not be made.
    #[error("http error: {0}")]
    Http(String),

    /// The frame could not be rendered or parsed.
    #[error("frame error: {0}")]
    Ax25(#[from] aprskiss_ax25::Ax25Error),

    /// Unrecognized protocol name.
    #[error("unknown protocol {0:?} (expected tcp, http or udp)")]
    UnknownProtocol(String),
}

impl AprsIsError {
    /// True for failures a reconnect can cure: a reset or broken connection,
    /// or a failed attempt to open a new one.
    pub fn is_connection_lost(&self) -> bool {
        match self {
            Self::Io(err) => is_reset(err),
            Self::Transport(_) | Self::ConnectionClosed => true,
            _ => false,
        }
    }
}

pub(crate) fn is_reset(err: &std::io::Error) -> bool {
    use std::io::ErrorKind;
    matches!(
        err.kind(),
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::NotConnected
            | ErrorKind::UnexpectedEof
            | ErrorKind::WriteZero
    )
}

pub type Result<T> = std::result::Result<T, AprsIsError>;

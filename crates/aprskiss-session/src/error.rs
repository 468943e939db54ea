/// Errors that can occur in TNC session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Opening or configuring the link failed.
    #[error("transport error: {0}")]
    Transport(#[from] aprskiss_transport::TransportError),

    /// KISS-level error on the link.
    #[error("kiss error: {0}")]
    Kiss(#[from] aprskiss_kiss::KissError),

    /// The frame could not be encoded.
    #[error("ax.25 error: {0}")]
    Ax25(#[from] aprskiss_ax25::Ax25Error),

    /// The session has been closed.
    #[error("session closed")]
    Closed,

    /// Unrecognized mode-init preset name.
    #[error("unknown mode-init preset {0:?} (expected none, w8ded or linknord)")]
    UnknownModeInit(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;

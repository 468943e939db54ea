/// Errors that can occur while reading or writing KISS frames.
#[derive(Debug, thiserror::Error)]
pub enum KissError {
    /// The payload exceeds the configured maximum frame size.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// An I/O error occurred on the underlying link.
    #[error("kiss I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link was closed by the remote end.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, KissError>;

use std::fmt;
use std::io;

use aprskiss_aprsis::AprsIsError;
use aprskiss_ax25::Ax25Error;
use aprskiss_kiss::KissError;
use aprskiss_session::SessionError;
use aprskiss_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Resolve { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn kiss_error(context: &str, err: KissError) -> CliError {
    match err {
        KissError::Io(source) => io_error(context, source),
        KissError::FrameTooLarge { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        KissError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn ax25_error(context: &str, err: Ax25Error) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Transport(err) => transport_error(context, err),
        SessionError::Kiss(err) => kiss_error(context, err),
        SessionError::Ax25(err) => ax25_error(context, err),
        SessionError::UnknownModeInit(_) => CliError::usage(format!("{context}: {err}")),
        SessionError::Closed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn aprsis_error(context: &str, err: AprsIsError) -> CliError {
    match err {
        AprsIsError::Transport(err) => transport_error(context, err),
        AprsIsError::Io(source) => io_error(context, source),
        AprsIsError::Ax25(err) => ax25_error(context, err),
        AprsIsError::UnknownProtocol(_) => CliError::usage(format!("{context}: {err}")),
        AprsIsError::RetriesExhausted { .. } | AprsIsError::Http(_) => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
        other => CliError::new(FAILURE, format!("{context}: {other}")),
    }
}

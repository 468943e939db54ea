//! TCP links.
//!
//! Software modems (Dire Wolf, soundmodem, UZ7HO) and networked TNCs expose
//! their KISS interface on a TCP port, commonly 8001.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::link::Link;

/// Default connection timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// TCP connect configuration.
#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// Maximum time to wait for each resolved address to accept.
    pub connect_timeout: Duration,
    /// Disable Nagle's algorithm. Default: true.
    pub nodelay: bool,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            nodelay: true,
        }
    }
}

/// Connect to `host:port` (blocking), trying every resolved address in turn.
pub fn connect_tcp(host: &str, port: u16, config: &TcpConfig) -> Result<Link> {
    let addr = format!("{host}:{port}");
    let resolved = (host, port)
        .to_socket_addrs()
        .map_err(|source| TransportError::Resolve {
            addr: addr.clone(),
            source,
        })?;

    let mut last_err = None;
    for candidate in resolved {
        debug!(%addr, %candidate, "connecting");
        match TcpStream::connect_timeout(&candidate, config.connect_timeout) {
            Ok(stream) => {
                if config.nodelay {
                    if let Err(e) = stream.set_nodelay(true) {
                        warn!(%addr, error = %e, "failed to set TCP_NODELAY");
                    }
                }
                info!(%addr, "tcp link established");
                return Ok(Link::from_tcp(stream));
            }
            Err(e) => last_err = Some(e),
        }
    }

    Err(TransportError::Connect {
        addr,
        source: last_err.unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                "host resolved to no addresses",
            )
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn connects_to_loopback_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let link = connect_tcp("127.0.0.1", port, &TcpConfig::default()).unwrap();
        assert_eq!(link.kind(), "tcp");
    }

    #[test]
    fn refused_connection_reports_address() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = connect_tcp("127.0.0.1", port, &TcpConfig::default()).unwrap_err();
        match err {
            TransportError::Connect { addr, .. } => assert_eq!(addr, format!("127.0.0.1:{port}")),
            other => panic!("unexpected error: {other}"),
        }
    }
}

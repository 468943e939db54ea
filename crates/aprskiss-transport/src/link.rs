use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use serialport::SerialPort;

use crate::error::{Result, TransportError};
use crate::serial::{open_serial, SerialConfig};
use crate::tcp::{connect_tcp, TcpConfig};

/// An open link to a TNC. Implements Read + Write.
///
/// This is the fundamental I/O type returned by [`open_serial`] and
/// [`connect_tcp`]. The device handle is released when the `Link` (and every
/// clone made with [`Link::try_clone`]) is dropped.
pub struct Link {
    inner: LinkInner,
}

enum LinkInner {
    Serial(Box<dyn SerialPort>),
    Tcp(TcpStream),
}

impl Read for Link {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            LinkInner::Serial(port) => port.read(buf),
            LinkInner::Tcp(stream) => stream.read(buf),
        }
    }
}

impl Write for Link {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            LinkInner::Serial(port) => port.write(buf),
            LinkInner::Tcp(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            LinkInner::Serial(port) => port.flush(),
            LinkInner::Tcp(stream) => stream.flush(),
        }
    }
}

impl Link {
    pub(crate) fn from_serial(port: Box<dyn SerialPort>) -> Self {
        Self {
            inner: LinkInner::Serial(port),
        }
    }

    /// Wrap an already connected TCP stream.
    pub fn from_tcp(stream: TcpStream) -> Self {
        Self {
            inner: LinkInner::Tcp(stream),
        }
    }

    /// Set the read timeout on the underlying stream.
    ///
    /// Serial ports always carry a timeout, so `None` leaves the one chosen
    /// at open time in place.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        match &mut self.inner {
            LinkInner::Serial(port) => match timeout {
                Some(timeout) => port
                    .set_timeout(timeout)
                    .map_err(|e| TransportError::Io(e.into())),
                None => Ok(()),
            },
            LinkInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set the write timeout on the underlying stream (TCP only).
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            LinkInner::Serial(_) => Ok(()),
            LinkInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Try to clone this link (a second handle to the same device).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            LinkInner::Serial(port) => {
                let cloned = port
                    .try_clone()
                    .map_err(|e| TransportError::Io(e.into()))?;
                Ok(Self::from_serial(cloned))
            }
            LinkInner::Tcp(stream) => Ok(Self::from_tcp(stream.try_clone()?)),
        }
    }

    /// Shut the link down for both directions.
    ///
    /// For TCP this wakes any thread blocked reading a clone of the socket.
    /// Serial ports have no shutdown; they close when the last handle drops.
    pub fn shutdown(&self) -> Result<()> {
        match &self.inner {
            LinkInner::Serial(_) => Ok(()),
            LinkInner::Tcp(stream) => match stream.shutdown(Shutdown::Both) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
                Err(err) => Err(err.into()),
            },
        }
    }

    /// Link kind for diagnostics.
    pub fn kind(&self) -> &'static str {
        match &self.inner {
            LinkInner::Serial(_) => "serial",
            LinkInner::Tcp(_) => "tcp",
        }
    }
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            LinkInner::Serial(port) => f
                .debug_struct("Link")
                .field("type", &"serial")
                .field("port", &port.name())
                .finish(),
            LinkInner::Tcp(stream) => f
                .debug_struct("Link")
                .field("type", &"tcp")
                .field("peer", &stream.peer_addr().ok())
                .finish(),
        }
    }
}

/// Where and how to open a link.
#[derive(Debug, Clone)]
pub enum LinkConfig {
    /// A serial device such as `/dev/ttyUSB0` or `COM3`.
    Serial { path: String, config: SerialConfig },
    /// A TCP endpoint such as a soundmodem's KISS port.
    Tcp {
        host: String,
        port: u16,
        config: TcpConfig,
    },
}

impl LinkConfig {
    /// Serial link with default line settings at the given baud rate.
    pub fn serial(path: impl Into<String>, baud_rate: u32) -> Self {
        Self::Serial {
            path: path.into(),
            config: SerialConfig {
                baud_rate,
                ..SerialConfig::default()
            },
        }
    }

    /// TCP link with default connect settings.
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
            config: TcpConfig::default(),
        }
    }

    /// Open the link (blocking).
    pub fn open(&self) -> Result<Link> {
        match self {
            Self::Serial { path, config } => open_serial(path, config),
            Self::Tcp { host, port, config } => connect_tcp(host, *port, config),
        }
    }

    /// Human-readable endpoint for logs.
    pub fn endpoint(&self) -> String {
        match self {
            Self::Serial { path, config } => format!("{path}@{}", config.baud_rate),
            Self::Tcp { host, port, .. } => format!("{host}:{port}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn tcp_link_read_write() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = std::thread::spawn(move || {
            let (mut server, _) = listener.accept().unwrap();
            let mut buf = [0u8; 5];
            server.read_exact(&mut buf).unwrap();
            server.write_all(&buf).unwrap();
        });

        let mut link = LinkConfig::tcp("127.0.0.1", addr.port()).open().unwrap();
        assert_eq!(link.kind(), "tcp");
        link.write_all(b"hello").unwrap();
        let mut buf = [0u8; 5];
        link.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");

        handle.join().unwrap();
    }

    #[test]
    fn shutdown_wakes_cloned_reader() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || listener.accept().unwrap());

        let link = LinkConfig::tcp("127.0.0.1", addr.port()).open().unwrap();
        let _server_side = server.join().unwrap();

        let mut reader = link.try_clone().unwrap();
        let blocked = std::thread::spawn(move || {
            let mut buf = [0u8; 8];
            reader.read(&mut buf)
        });

        link.shutdown().unwrap();
        let read = blocked.join().unwrap();
        assert!(matches!(read, Ok(0) | Err(_)));
    }

    #[test]
    fn writes_after_shutdown_fail_as_io() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || listener.accept().unwrap());

        let mut link = LinkConfig::tcp("127.0.0.1", addr.port()).open().unwrap();
        let _server_side = server.join().unwrap();

        link.shutdown().unwrap();
        // A second shutdown is not an error.
        link.shutdown().unwrap();

        let err = link.write(b"late").unwrap_err();
        let err = TransportError::from(err);
        assert!(matches!(err, TransportError::Io(_)));
    }

    #[test]
    fn endpoint_formatting() {
        assert_eq!(
            LinkConfig::serial("/dev/ttyUSB0", 9600).endpoint(),
            "/dev/ttyUSB0@9600"
        );
        assert_eq!(LinkConfig::tcp("localhost", 8001).endpoint(), "localhost:8001");
    }
}

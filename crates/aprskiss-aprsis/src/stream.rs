//! Connection seams for the APRS-IS client.
//!
//! The client only needs a byte stream it can clone for a concurrent reader
//! and shut down to wake that reader. [`Connector`] opens such streams, so
//! the reconnect path can be exercised without a network.

use std::io::{self, Read, Write};
use std::time::Duration;

use aprskiss_transport::{connect_tcp, Link, TcpConfig, TransportError};

use crate::error::Result;

/// A connected, bidirectional APRS-IS byte stream.
pub trait IsStream: Read + Write + Send {
    /// A second handle to the same connection.
    fn clone_stream(&self) -> io::Result<Box<dyn IsStream>>;

    /// Shut the connection down for both directions.
    fn close_stream(&self) -> io::Result<()>;

    fn set_stream_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;
}

impl IsStream for Link {
    fn clone_stream(&self) -> io::Result<Box<dyn IsStream>> {
        Ok(Box::new(self.try_clone().map_err(into_io)?))
    }

    fn close_stream(&self) -> io::Result<()> {
        self.shutdown().map_err(into_io)
    }

    fn set_stream_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.set_read_timeout(timeout).map_err(into_io)
    }
}

fn into_io(err: TransportError) -> io::Error {
    match err {
        TransportError::Io(err) => err,
        other => io::Error::other(other),
    }
}

/// Opens connections to APRS-IS servers.
pub trait Connector: Send {
    fn connect(&self, host: &str, port: u16) -> Result<Box<dyn IsStream>>;
}

/// Plain TCP connections.
#[derive(Debug, Clone, Default)]
pub struct TcpConnector {
    pub config: TcpConfig,
}

impl Connector for TcpConnector {
    fn connect(&self, host: &str, port: u16) -> Result<Box<dyn IsStream>> {
        Ok(Box::new(connect_tcp(host, port, &self.config)?))
    }
}

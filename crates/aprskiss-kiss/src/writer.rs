use std::io::{ErrorKind, Write};

use aprskiss_transport::Link;
use bytes::BytesMut;
use tracing::debug;

use crate::codec::{encode_command, encode_data_frame, KissConfig};
use crate::error::{KissError, Result};
use crate::reader::transport_to_kiss_error;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes KISS frames to any `Write` stream.
pub struct KissWriter<T> {
    inner: T,
    buf: BytesMut,
    config: KissConfig,
}

impl<T: Write> KissWriter<T> {
    /// Create a new writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, KissConfig::default())
    }

    /// Create a new writer with explicit configuration.
    pub fn with_config(inner: T, config: KissConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Wrap `payload` (a raw AX.25 frame) in a data frame and send it.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_data_frame(payload, &mut self.buf);
        self.check_encoded_size()?;
        self.write_buffered()?;
        debug!(len = payload.len(), "kiss data frame sent");
        Ok(())
    }

    /// Send a TNC parameter command such as `TX_DELAY`.
    pub fn send_command(&mut self, command: u8, value: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_command(command, value, &mut self.buf);
        self.check_encoded_size()?;
        self.write_buffered()?;
        debug!(
            command = crate::command::command_name(command),
            "kiss command sent"
        );
        Ok(())
    }

    /// Write bytes verbatim, without framing or escaping.
    ///
    /// Used for the firmware mode-switch sequences sent before and after a
    /// KISS session.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all_retrying(bytes)?;
        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if self.is_retryable(err.kind()) => continue,
                Err(err) => return Err(KissError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current writer configuration.
    pub fn config(&self) -> &KissConfig {
        &self.config
    }

    /// The limit covers the command byte and the escaped payload, the same
    /// bytes a [`crate::Deframer`] on the far side accumulates.
    fn check_encoded_size(&mut self) -> Result<()> {
        let size = self.buf.len().saturating_sub(2);
        if size > self.config.max_frame_size {
            self.buf.clear();
            return Err(KissError::FrameTooLarge {
                size,
                max: self.config.max_frame_size,
            });
        }
        Ok(())
    }

    // With a write timeout set, WouldBlock is the expired timeout (EAGAIN on
    // Unix) and must surface instead of being retried.
    fn is_retryable(&self, kind: ErrorKind) -> bool {
        match kind {
            ErrorKind::Interrupted => true,
            ErrorKind::WouldBlock => self.config.write_timeout.is_none(),
            _ => false,
        }
    }

    fn write_buffered(&mut self) -> Result<()> {
        let wire = self.buf.split();
        let result = self.write_all_retrying(&wire);
        self.buf = wire;
        result?;
        self.flush()
    }

    fn write_all_retrying(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(KissError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if self.is_retryable(err.kind()) => continue,
                Err(err) => return Err(KissError::Io(err)),
            }
        }
        Ok(())
    }
}

impl KissWriter<Link> {
    /// Create a writer for a [`Link`] and apply the write timeout from config.
    pub fn with_config_link(inner: Link, config: KissConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_kiss_error)?;
        Ok(Self::with_config(inner, config))
    }
}

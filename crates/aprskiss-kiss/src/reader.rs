use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};

use aprskiss_transport::Link;
use bytes::Bytes;
use tracing::{debug, trace};

use crate::codec::{extract_data, Deframer, KissConfig};
use crate::error::{KissError, Result};

const READ_CHUNK_SIZE: usize = 1024;

/// Reads KISS data frames from any `Read` stream.
///
/// Handles partial reads internally: the accumulation buffer survives across
/// reads for the life of the reader, so callers always get complete frames.
/// The reader owns that buffer; share the stream for writing through a
/// separate handle, never the reader itself.
pub struct KissReader<T> {
    inner: T,
    deframer: Deframer,
    ready: VecDeque<Bytes>,
    config: KissConfig,
}

impl<T: Read> KissReader<T> {
    /// Create a new reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, KissConfig::default())
    }

    /// Create a new reader with explicit configuration.
    pub fn with_config(inner: T, config: KissConfig) -> Self {
        Self {
            inner,
            deframer: Deframer::new(config.max_frame_size),
            ready: VecDeque::new(),
            config,
        }
    }

    /// Perform one read and return every frame it completed, still escaped
    /// and with the command byte.
    ///
    /// Returns an empty batch when the read times out.
    pub fn read_raw(&mut self) -> Result<Vec<Bytes>> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let read = loop {
            match self.inner.read(&mut chunk) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if is_timeout(&err) => return Ok(Vec::new()),
                Err(err) => return Err(KissError::Io(err)),
            }
        };

        if read == 0 {
            return Err(KissError::ConnectionClosed);
        }
        trace!(read, "kiss bytes received");

        let mut frames = Vec::new();
        self.deframer.push(&chunk[..read], &mut frames);
        Ok(frames)
    }

    /// Pull mode: perform one read and return the data-frame payloads it
    /// completed, command byte stripped.
    ///
    /// Payloads completed by an earlier call but not yet handed out are
    /// returned first. Returns an empty batch when the read times out.
    pub fn read_frames(&mut self) -> Result<Vec<Bytes>> {
        let mut out: Vec<Bytes> = self.ready.drain(..).collect();
        for raw in self.read_raw()? {
            if let Some(payload) = extract_data(&raw) {
                debug!(len = payload.len(), "kiss data frame received");
                out.push(payload);
            }
        }
        Ok(out)
    }

    /// Read the next data-frame payload (blocking).
    ///
    /// Returns `Err(KissError::ConnectionClosed)` when EOF is reached. A read
    /// timeout is reported as `KissError::Io` with kind `TimedOut`.
    pub fn read_frame(&mut self) -> Result<Bytes> {
        loop {
            if let Some(payload) = self.ready.pop_front() {
                return Ok(payload);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(KissError::Io(err)),
            };

            if read == 0 {
                return Err(KissError::ConnectionClosed);
            }

            let mut frames = Vec::new();
            self.deframer.push(&chunk[..read], &mut frames);
            self.ready
                .extend(frames.iter().filter_map(|raw| extract_data(raw)));
        }
    }

    /// Push mode: deliver every data-frame payload to `callback` until it
    /// breaks, `stop` is set, or the link fails.
    ///
    /// Read timeouts are idle ticks: they only give `stop` a chance to be
    /// observed.
    pub fn run<F>(&mut self, stop: &AtomicBool, mut callback: F) -> Result<()>
    where
        F: FnMut(Bytes) -> ControlFlow<()>,
    {
        while !stop.load(Ordering::SeqCst) {
            for payload in self.read_frames()? {
                if callback(payload).is_break() {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Number of bytes held for a frame not yet delimited.
    pub fn pending(&self) -> usize {
        self.deframer.pending()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &KissConfig {
        &self.config
    }
}

impl KissReader<Link> {
    /// Create a reader for a [`Link`] and apply the read timeout from config.
    pub fn with_config_link(mut inner: Link, config: KissConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_kiss_error)?;
        Ok(Self::with_config(inner, config))
    }
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
}

pub(crate) fn transport_to_kiss_error(err: aprskiss_transport::TransportError) -> KissError {
    match err {
        aprskiss_transport::TransportError::Io(io) => KissError::Io(io),
        aprskiss_transport::TransportError::Connect { source, .. }
        | aprskiss_transport::TransportError::Resolve { source, .. } => KissError::Io(source),
        other => KissError::Io(std::io::Error::other(other.to_string())),
    }
}

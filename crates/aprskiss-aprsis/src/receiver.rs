use std::io::ErrorKind;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, trace};

use crate::error::{AprsIsError, Result};
use crate::lines::LineSplitter;
use crate::login::parse_logresp;
use crate::stream::IsStream;

/// Bytes requested per read.
pub const RECV_BUFFER_SIZE: usize = 1024;

/// Receives APRS-IS lines on its own handle to a connection.
///
/// Obtained from [`crate::AprsIsClient::receiver`] so a receive loop can run
/// on another thread while the client sends. It owns its line buffer; after
/// the client reconnects, take a new receiver.
pub struct AprsIsReceiver {
    stream: Box<dyn IsStream>,
    lines: LineSplitter,
    stop: Arc<AtomicBool>,
}

impl AprsIsReceiver {
    pub(crate) fn new(stream: Box<dyn IsStream>, stop: Arc<AtomicBool>) -> Self {
        Self {
            stream,
            lines: LineSplitter::default(),
            stop,
        }
    }

    /// Pull mode: one read, returning the lines it completed. Server comment
    /// lines are logged, never returned. Empty when the read timed out.
    pub fn read_lines(&mut self) -> Result<Vec<String>> {
        read_batch(self.stream.as_mut(), &mut self.lines)
    }

    /// Push mode: deliver lines to `callback` until it breaks, the stop flag
    /// is set, or the server closes the connection. Socket errors are
    /// returned.
    pub fn run<F>(&mut self, callback: F) -> Result<()>
    where
        F: FnMut(&str) -> ControlFlow<()>,
    {
        pump(self.stream.as_mut(), &mut self.lines, &self.stop, callback)
    }

    /// Flag that stops [`AprsIsReceiver::run`] from another thread.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }
}

impl std::fmt::Debug for AprsIsReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AprsIsReceiver")
            .field("pending", &self.lines.pending())
            .field("stopped", &self.stop.load(Ordering::SeqCst))
            .finish()
    }
}

pub(crate) fn read_batch(
    stream: &mut dyn IsStream,
    lines: &mut LineSplitter,
) -> Result<Vec<String>> {
    let mut buf = [0u8; RECV_BUFFER_SIZE];
    let read = loop {
        match stream.read(&mut buf) {
            Ok(n) => break n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                return Ok(Vec::new())
            }
            Err(err) => return Err(AprsIsError::Io(err)),
        }
    };
    if read == 0 {
        return Err(AprsIsError::ConnectionClosed);
    }
    trace!(read, "aprs-is bytes received");

    let mut completed = Vec::new();
    lines.push(&buf[..read], &mut completed);
    completed.retain(|line| deliverable(line));
    Ok(completed)
}

pub(crate) fn pump<F>(
    stream: &mut dyn IsStream,
    lines: &mut LineSplitter,
    stop: &AtomicBool,
    mut callback: F,
) -> Result<()>
where
    F: FnMut(&str) -> ControlFlow<()>,
{
    while !stop.load(Ordering::SeqCst) {
        let batch = match read_batch(stream, lines) {
            Ok(batch) => batch,
            Err(AprsIsError::ConnectionClosed) => {
                info!("aprs-is connection closed by server");
                return Ok(());
            }
            Err(err) => {
                error!(error = %err, "aprs-is receive failed");
                return Err(err);
            }
        };
        for line in batch {
            if callback(&line).is_break() {
                return Ok(());
            }
        }
    }
    Ok(())
}

fn deliverable(line: &str) -> bool {
    if !line.starts_with('#') {
        debug!(line, "aprs-is line received");
        return true;
    }
    match parse_logresp(line) {
        Some(resp) => info!(
            callsign = %resp.callsign,
            verified = resp.verified,
            server = resp.server.as_deref().unwrap_or("-"),
            "aprs-is login response"
        ),
        None => debug!(line, "aprs-is server comment"),
    }
    false
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::time::Duration;

    use super::*;

    struct ScriptedReader {
        chunks: Vec<std::io::Result<Vec<u8>>>,
    }

    impl Read for ScriptedReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.chunks.is_empty() {
                return Ok(0);
            }
            let chunk = self.chunks.remove(0)?;
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
    }

    impl Write for ScriptedReader {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl IsStream for ScriptedReader {
        fn clone_stream(&self) -> std::io::Result<Box<dyn IsStream>> {
            Err(std::io::Error::other("not cloneable"))
        }

        fn close_stream(&self) -> std::io::Result<()> {
            Ok(())
        }

        fn set_stream_read_timeout(&mut self, _timeout: Option<Duration>) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn receiver(chunks: Vec<std::io::Result<Vec<u8>>>) -> AprsIsReceiver {
        AprsIsReceiver::new(
            Box::new(ScriptedReader { chunks }),
            Arc::new(AtomicBool::new(false)),
        )
    }

    fn collect(receiver: &mut AprsIsReceiver) -> Result<Vec<String>> {
        let mut seen = Vec::new();
        receiver.run(|line| {
            seen.push(line.to_string());
            ControlFlow::Continue(())
        })?;
        Ok(seen)
    }

    #[test]
    fn comment_lines_are_never_delivered() {
        let mut rx = receiver(vec![Ok(
            b"# aprsc 2.1\r\n# logresp N0CALL verified, server T2\r\nN0CALL>APRS:!a\r\n".to_vec(),
        )]);
        assert_eq!(collect(&mut rx).unwrap(), vec!["N0CALL>APRS:!a"]);
    }

    #[test]
    fn lines_split_across_reads() {
        let mut rx = receiver(vec![
            Ok(b"N0CALL>AP".to_vec()),
            Ok(b"RS:!a\r".to_vec()),
            Ok(b"\nN1>APRS:!b\r\n".to_vec()),
        ]);
        assert_eq!(collect(&mut rx).unwrap(), vec!["N0CALL>APRS:!a", "N1>APRS:!b"]);
    }

    #[test]
    fn timeouts_are_idle_ticks() {
        let mut rx = receiver(vec![
            Err(ErrorKind::TimedOut.into()),
            Err(ErrorKind::WouldBlock.into()),
            Err(ErrorKind::Interrupted.into()),
            Ok(b"A1>APRS:x\r\n".to_vec()),
        ]);
        assert!(rx.read_lines().unwrap().is_empty());
        assert!(rx.read_lines().unwrap().is_empty());
        assert_eq!(rx.read_lines().unwrap(), vec!["A1>APRS:x"]);
        assert!(matches!(
            rx.read_lines(),
            Err(AprsIsError::ConnectionClosed)
        ));
    }

    #[test]
    fn socket_errors_are_reported() {
        let mut rx = receiver(vec![
            Ok(b"A1>APRS:x\r\n".to_vec()),
            Err(ErrorKind::ConnectionReset.into()),
        ]);
        let err = collect(&mut rx).unwrap_err();
        assert!(matches!(err, AprsIsError::Io(e) if e.kind() == ErrorKind::ConnectionReset));
    }

    #[test]
    fn callback_can_stop_the_loop() {
        let mut rx = receiver(vec![Ok(b"A1>APRS:1\r\nA1>APRS:2\r\n".to_vec())]);
        let mut seen = 0;
        rx.run(|_| {
            seen += 1;
            ControlFlow::Break(())
        })
        .unwrap();
        assert_eq!(seen, 1);
    }

    #[test]
    fn stop_flag_is_checked_before_reading() {
        let mut rx = receiver(vec![Ok(b"A1>APRS:1\r\n".to_vec())]);
        rx.stop_handle().store(true, Ordering::SeqCst);
        assert!(collect(&mut rx).unwrap().is_empty());
    }

    #[test]
    fn debug_reports_pending_bytes() {
        let mut rx = receiver(vec![Ok(b"partial".to_vec())]);
        rx.read_lines().unwrap();
        assert!(format!("{rx:?}").contains("pending: 7"));
    }
}

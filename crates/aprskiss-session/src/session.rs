use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use aprskiss_ax25::{decode_frame, Frame};
use aprskiss_kiss::{command_name, KissConfig, KissReader, KissWriter};
use aprskiss_transport::{Link, LinkConfig};
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::mode::{KissSettings, ModeInit, MODE_END};

/// Read timeout used by sessions unless configured otherwise. Push-mode
/// loops check their stop flag at least this often.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sequence sent right after the link opens.
    pub mode_init: ModeInit,
    /// Parameters written after the mode-init sequence.
    pub settings: KissSettings,
    /// Framing limits and link timeouts.
    pub kiss: KissConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode_init: ModeInit::None,
            settings: KissSettings::default(),
            kiss: KissConfig {
                read_timeout: Some(DEFAULT_POLL_INTERVAL),
                ..KissConfig::default()
            },
        }
    }
}

/// A KISS session with one TNC.
///
/// The session owns the reassembly state and is the only reader of the link.
/// Dropping it sends the mode-exit sequence (when a mode-init sequence was
/// sent) and shuts the link down, on every exit path.
pub struct TncSession {
    reader: KissReader<Link>,
    writer: TncWriter,
    control: Link,
    endpoint: String,
    stop: Arc<AtomicBool>,
    exit_pending: bool,
}

impl TncSession {
    /// Open the link described by `link` and initialize the TNC.
    pub fn open(link: &LinkConfig, config: SessionConfig) -> Result<Self> {
        let opened = link.open()?;
        Self::from_link(opened, link.endpoint(), config)
    }

    /// Start a session on an already open link.
    pub fn from_link(
        link: Link,
        endpoint: impl Into<String>,
        config: SessionConfig,
    ) -> Result<Self> {
        let control = link.try_clone()?;
        let write_link = link.try_clone()?;
        let reader = KissReader::with_config_link(link, config.kiss.clone())?;
        let writer = KissWriter::with_config_link(write_link, config.kiss.clone())?;

        let mut session = Self {
            reader,
            writer: TncWriter {
                inner: Arc::new(Mutex::new(writer)),
                closed: Arc::new(AtomicBool::new(false)),
            },
            control,
            endpoint: endpoint.into(),
            stop: Arc::new(AtomicBool::new(false)),
            exit_pending: false,
        };
        // On failure `session` drops here, which restores the TNC mode and
        // shuts the link down.
        session.initialize(&config)?;

        info!(
            endpoint = %session.endpoint,
            kind = session.control.kind(),
            mode_init = ?config.mode_init,
            "tnc session opened"
        );
        Ok(session)
    }

    fn initialize(&mut self, config: &SessionConfig) -> Result<()> {
        if let Some(sequence) = config.mode_init.sequence() {
            self.exit_pending = true;
            self.writer.lock().write_raw(sequence)?;
            debug!(len = sequence.len(), "mode-init sequence sent");
        }
        for (command, value) in config.settings.commands() {
            self.writer.lock().send_command(command, &[value])?;
            debug!(command = command_name(command), value, "kiss parameter set");
        }
        Ok(())
    }

    /// Encode `frame` as AX.25 and transmit it.
    pub fn write_frame(&self, frame: &Frame) -> Result<()> {
        self.writer.write_frame(frame)
    }

    /// Transmit an already encoded AX.25 frame.
    pub fn write_bytes(&self, raw: &[u8]) -> Result<()> {
        self.writer.write_bytes(raw)
    }

    /// A cloneable handle for transmitting from other threads.
    pub fn writer(&self) -> TncWriter {
        self.writer.clone()
    }

    /// Pull mode: one link read, returning the KISS data payloads it
    /// completed. Empty when the read timed out.
    pub fn read_payloads(&mut self) -> Result<Vec<Bytes>> {
        self.ensure_open()?;
        Ok(self.reader.read_frames()?)
    }

    /// Pull mode: one link read, returning the APRS frames it completed.
    /// Payloads that are not AX.25 UI frames are dropped.
    pub fn read_frames(&mut self) -> Result<Vec<Frame>> {
        Ok(self
            .read_payloads()?
            .iter()
            .filter_map(|payload| decode_or_log(payload))
            .collect())
    }

    /// Push mode: deliver each KISS data payload to `callback` until it
    /// breaks, the stop flag is set, or the link fails.
    pub fn run_payloads<F>(&mut self, callback: F) -> Result<()>
    where
        F: FnMut(Bytes) -> ControlFlow<()>,
    {
        self.ensure_open()?;
        self.reader.run(&self.stop, callback)?;
        Ok(())
    }

    /// Push mode: deliver each decoded APRS frame to `callback` until it
    /// breaks, the stop flag is set, or the link fails.
    pub fn run<F>(&mut self, mut callback: F) -> Result<()>
    where
        F: FnMut(Frame) -> ControlFlow<()>,
    {
        self.run_payloads(|payload| match decode_or_log(&payload) {
            Some(frame) => callback(frame),
            None => ControlFlow::Continue(()),
        })
    }

    /// Flag that stops [`TncSession::run`] from another thread. Once set it
    /// stays set.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Link endpoint, for logs.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send the mode-exit sequence if needed and shut the link down.
    pub fn close(mut self) -> Result<()> {
        self.finish()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.writer.is_closed() {
            return Err(SessionError::Closed);
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        // The flag flips under the writer lock so no frame can follow MODE_END.
        let exit = {
            let mut writer = self.writer.lock();
            if self.writer.closed.swap(true, Ordering::SeqCst) {
                return Ok(());
            }
            self.stop.store(true, Ordering::SeqCst);

            if self.exit_pending {
                self.exit_pending = false;
                writer.write_raw(&MODE_END)
            } else {
                Ok(())
            }
        };
        let shutdown = self.control.shutdown();
        info!(endpoint = %self.endpoint, "tnc session closed");

        exit?;
        shutdown?;
        Ok(())
    }
}

impl Drop for TncSession {
    fn drop(&mut self) {
        if let Err(err) = self.finish() {
            warn!(endpoint = %self.endpoint, error = %err, "tnc session close failed");
        }
    }
}

impl std::fmt::Debug for TncSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TncSession")
            .field("endpoint", &self.endpoint)
            .field("link", &self.control)
            .field("closed", &self.writer.is_closed())
            .finish()
    }
}

fn decode_or_log(payload: &[u8]) -> Option<Frame> {
    let frame = decode_frame(payload);
    if frame.is_none() {
        debug!(len = payload.len(), "dropping payload that is not an ax.25 ui frame");
    }
    frame
}

/// Transmit handle for a [`TncSession`].
///
/// Clones share one writer behind a mutex, so frames from different threads
/// never interleave. Writes fail with [`SessionError::Closed`] once the
/// session is closed.
#[derive(Clone)]
pub struct TncWriter {
    inner: Arc<Mutex<KissWriter<Link>>>,
    closed: Arc<AtomicBool>,
}

impl TncWriter {
    /// Encode `frame` as AX.25 and transmit it.
    pub fn write_frame(&self, frame: &Frame) -> Result<()> {
        let raw = frame.encode()?;
        self.write_bytes(&raw)?;
        debug!(frame = %frame, "frame sent");
        Ok(())
    }

    /// Transmit an already encoded AX.25 frame.
    pub fn write_bytes(&self, raw: &[u8]) -> Result<()> {
        self.open_writer()?.send(raw)?;
        Ok(())
    }

    /// Send a KISS parameter command.
    pub fn send_command(&self, command: u8, value: u8) -> Result<()> {
        self.open_writer()?.send_command(command, &[value])?;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn open_writer(&self) -> Result<MutexGuard<'_, KissWriter<Link>>> {
        let writer = self.lock();
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        Ok(writer)
    }

    fn lock(&self) -> MutexGuard<'_, KissWriter<Link>> {
        // A panic mid-write cannot leave the writer itself inconsistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for TncWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TncWriter")
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use aprskiss_ax25::Callsign;
    use aprskiss_kiss::{encode_data_frame, extract_data, Deframer, TX_DELAY};
    use bytes::BytesMut;

    use super::*;
    use crate::mode::MODE_INIT_W8DED;

    fn tnc() -> (TcpListener, LinkConfig) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, LinkConfig::tcp("127.0.0.1", port))
    }

    fn fast_config() -> SessionConfig {
        SessionConfig {
            kiss: KissConfig {
                read_timeout: Some(Duration::from_millis(20)),
                ..KissConfig::default()
            },
            ..SessionConfig::default()
        }
    }

    fn sample_frame(payload: &str) -> Frame {
        Frame::new(
            "WI2ARD-1".parse().unwrap(),
            "APRS".parse().unwrap(),
            vec![Callsign::parse_hop("WIDE1-1").unwrap()],
            Bytes::copy_from_slice(payload.as_bytes()),
        )
    }

    fn kiss_wire(frame: &Frame) -> Vec<u8> {
        let mut wire = BytesMut::new();
        encode_data_frame(&frame.encode().unwrap(), &mut wire);
        wire.to_vec()
    }

    fn frames_in(wire: &[u8]) -> Vec<Frame> {
        let mut deframer = Deframer::default();
        let mut raw = Vec::new();
        deframer.push(wire, &mut raw);
        raw.iter()
            .filter_map(|r| extract_data(r))
            .filter_map(|p| decode_frame(&p))
            .collect()
    }

    #[test]
    fn open_sends_mode_init_then_settings() {
        let (listener, link) = tnc();
        let config = SessionConfig {
            mode_init: ModeInit::W8ded,
            settings: KissSettings::xastir(),
            ..fast_config()
        };
        let session = TncSession::open(&link, config).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        let mut wire = [0u8; 25];
        server.read_exact(&mut wire).unwrap();
        assert_eq!(&wire[..5], &MODE_INIT_W8DED);
        assert_eq!(&wire[5..9], &[0xC0, TX_DELAY, 40, 0xC0]);
        assert_eq!(&wire[21..], &[0xC0, 0x05, 0, 0xC0]);

        drop(session);
    }

    #[test]
    fn close_sends_mode_exit_and_releases_link() {
        let (listener, link) = tnc();
        let config = SessionConfig {
            mode_init: ModeInit::LinkNord,
            ..fast_config()
        };
        let session = TncSession::open(&link, config).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        session.close().unwrap();

        let mut wire = Vec::new();
        server.read_to_end(&mut wire).unwrap();
        assert_eq!(&wire[..5], &MODE_INIT_W8DED);
        assert_eq!(&wire[5..], &MODE_END);
    }

    #[test]
    fn drop_sends_mode_exit() {
        let (listener, link) = tnc();
        let config = SessionConfig {
            mode_init: ModeInit::Custom(vec![b'K', b'\r']),
            ..fast_config()
        };
        {
            let _session = TncSession::open(&link, config).unwrap();
        }
        let (mut server, _) = listener.accept().unwrap();

        let mut wire = Vec::new();
        server.read_to_end(&mut wire).unwrap();
        assert_eq!(wire, [&b"K\r"[..], &MODE_END[..]].concat());
    }

    #[test]
    fn no_mode_exit_without_mode_init() {
        let (listener, link) = tnc();
        let session = TncSession::open(&link, fast_config()).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        session.close().unwrap();

        let mut wire = Vec::new();
        server.read_to_end(&mut wire).unwrap();
        assert!(wire.is_empty());
    }

    #[test]
    fn write_frame_is_kiss_framed_ax25() {
        let (listener, link) = tnc();
        let session = TncSession::open(&link, fast_config()).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        let frame = sample_frame("!test");
        session.write_frame(&frame).unwrap();
        session.close().unwrap();

        let mut wire = Vec::new();
        server.read_to_end(&mut wire).unwrap();
        assert_eq!(wire, kiss_wire(&frame));
        assert_eq!(frames_in(&wire), vec![frame]);
    }

    #[test]
    fn read_frames_decodes_tnc_traffic() {
        let (listener, link) = tnc();
        let mut session = TncSession::open(&link, fast_config()).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        let frame = sample_frame(">on the air");
        let wire = kiss_wire(&frame);
        let (a, b) = wire.split_at(wire.len() / 2);
        server.write_all(a).unwrap();
        server.flush().unwrap();
        thread::sleep(Duration::from_millis(10));
        server.write_all(b).unwrap();

        let mut received = Vec::new();
        for _ in 0..50 {
            received.extend(session.read_frames().unwrap());
            if !received.is_empty() {
                break;
            }
        }
        assert_eq!(received, vec![frame]);
    }

    #[test]
    fn run_skips_undecodable_payloads() {
        let (listener, link) = tnc();
        let mut session = TncSession::open(&link, fast_config()).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        let mut wire = BytesMut::new();
        encode_data_frame(b"not ax.25", &mut wire);
        server.write_all(&wire).unwrap();
        server.write_all(&kiss_wire(&sample_frame("!1"))).unwrap();

        let mut seen = Vec::new();
        session
            .run(|frame| {
                seen.push(frame);
                ControlFlow::Break(())
            })
            .unwrap();
        assert_eq!(seen, vec![sample_frame("!1")]);
    }

    #[test]
    fn stop_handle_ends_push_loop() {
        let (listener, link) = tnc();
        let mut session = TncSession::open(&link, fast_config()).unwrap();
        let _server = listener.accept().unwrap();

        let stop = session.stop_handle();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(60));
            stop.store(true, Ordering::SeqCst);
        });

        session.run(|_| ControlFlow::Continue(())).unwrap();
        stopper.join().unwrap();
    }

    #[test]
    fn remote_close_is_reported() {
        let (listener, link) = tnc();
        let mut session = TncSession::open(&link, fast_config()).unwrap();
        let (server, _) = listener.accept().unwrap();
        drop(server);

        let err = session.run(|_| ControlFlow::Continue(())).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Kiss(aprskiss_kiss::KissError::ConnectionClosed)
                | SessionError::Kiss(aprskiss_kiss::KissError::Io(_))
        ));
    }

    #[test]
    fn writer_fails_after_close() {
        let (listener, link) = tnc();
        let session = TncSession::open(&link, fast_config()).unwrap();
        let _server = listener.accept().unwrap();

        let writer = session.writer();
        session.close().unwrap();

        assert!(writer.is_closed());
        assert!(matches!(
            writer.write_frame(&sample_frame("late")),
            Err(SessionError::Closed)
        ));
    }

    #[test]
    fn nothing_follows_mode_exit_when_writers_race_close() {
        let (listener, link) = tnc();
        let config = SessionConfig {
            mode_init: ModeInit::LinkNord,
            ..fast_config()
        };
        let session = TncSession::open(&link, config).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let writer = session.writer();
                thread::spawn(move || loop {
                    match writer.write_frame(&sample_frame("!racing")) {
                        Ok(()) => continue,
                        Err(SessionError::Closed) => break,
                        Err(err) => panic!("unexpected write error: {err}"),
                    }
                })
            })
            .collect();
        let reader = thread::spawn(move || {
            let mut wire = Vec::new();
            server.read_to_end(&mut wire).unwrap();
            wire
        });

        thread::sleep(Duration::from_millis(30));
        session.close().unwrap();
        for worker in workers {
            worker.join().unwrap();
        }

        let wire = reader.join().unwrap();
        assert!(wire.ends_with(&MODE_END));
        assert!(!frames_in(&wire[..wire.len() - MODE_END.len()]).is_empty());
    }

    #[test]
    fn concurrent_writers_do_not_interleave() {
        let (listener, link) = tnc();
        let session = TncSession::open(&link, fast_config()).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let writer = session.writer();
                thread::spawn(move || {
                    for n in 0..25 {
                        let mut payload = format!(":worker {worker} frame {n} ").into_bytes();
                        payload.extend_from_slice(&[0xC0, 0xDB]);
                        let mut frame = sample_frame("");
                        frame.payload = payload.into();
                        writer.write_frame(&frame).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        session.close().unwrap();

        let mut wire = Vec::new();
        server.read_to_end(&mut wire).unwrap();
        assert_eq!(frames_in(&wire).len(), 100);
    }

    #[test]
    fn send_command_after_open() {
        let (listener, link) = tnc();
        let session = TncSession::open(&link, fast_config()).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        session.writer().send_command(TX_DELAY, 30).unwrap();
        session.close().unwrap();

        let mut wire = Vec::new();
        server.read_to_end(&mut wire).unwrap();
        assert_eq!(wire, vec![0xC0, TX_DELAY, 30, 0xC0]);
    }

    #[test]
    fn open_reports_unreachable_tnc() {
        let (listener, link) = tnc();
        drop(listener);
        let err = TncSession::open(&link, fast_config()).unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
    }

    #[test]
    fn debug_shows_endpoint() {
        let (listener, link) = tnc();
        let session = TncSession::open(&link, fast_config()).unwrap();
        let _server = listener.accept().unwrap();
        let rendered = format!("{session:?}");
        assert!(rendered.contains(session.endpoint()));
    }
}

use std::fmt;
use std::io::Write;
use std::ops::ControlFlow;
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use aprskiss_ax25::Frame;
use aprskiss_transport::{TcpConfig, DEFAULT_CONNECT_TIMEOUT};
use tracing::{debug, info, warn};

use crate::error::{AprsIsError, Result};
use crate::http::{default_http_headers, HttpPost, DEFAULT_HTTP_URL};
use crate::lines::{LineSplitter, LINE_END};
use crate::login::Credentials;
use crate::receiver::{pump, read_batch, AprsIsReceiver};
use crate::retry::RetryPolicy;
use crate::stream::{Connector, IsStream, TcpConnector};
use crate::udp::{DatagramSend, UdpSender, DEFAULT_UDP_PORT};

/// Default APRS-IS server pool.
pub const DEFAULT_SERVER: &str = "rotate.aprs.net";

/// Default user-defined filter port.
pub const DEFAULT_FILTER_PORT: u16 = 14580;

/// How [`AprsIsClient::send`] submits a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    /// A line on the logged-in TCP connection.
    #[default]
    Tcp,
    /// A stateless HTTP POST; accepted when the server answers 204.
    Http,
    /// A stateless, unacknowledged datagram.
    Udp,
}

impl FromStr for Protocol {
    type Err = AprsIsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "http" => Ok(Self::Http),
            "udp" => Ok(Self::Udp),
            _ => Err(AprsIsError::UnknownProtocol(s.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tcp => "tcp",
            Self::Http => "http",
            Self::Udp => "udp",
        })
    }
}

/// APRS-IS client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credentials: Credentials,
    /// Server for TCP connections and UDP submissions.
    pub server: String,
    /// TCP port. Default: 14580, the filter port.
    pub port: u16,
    pub connect_timeout: Duration,
    pub udp_port: u16,
    pub http_url: String,
    pub http_headers: Vec<(String, String)>,
    pub http_timeout: Duration,
    /// Reconnect policy for TCP sends.
    pub retry: RetryPolicy,
    /// Read timeout on the TCP connection; receive loops check their stop
    /// flag at least this often.
    pub read_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            server: DEFAULT_SERVER.to_string(),
            port: DEFAULT_FILTER_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            udp_port: DEFAULT_UDP_PORT,
            http_url: DEFAULT_HTTP_URL.to_string(),
            http_headers: default_http_headers(),
            http_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            read_timeout: Some(Duration::from_millis(250)),
        }
    }
}

struct Connection {
    stream: Box<dyn IsStream>,
    server: String,
    port: u16,
    filter: Option<String>,
    lines: LineSplitter,
}

/// Client for the APRS-IS network.
///
/// TCP sends that hit a dropped connection reconnect, log in again and
/// retry under the configured [`RetryPolicy`]. Reconnecting needs `&mut self`,
/// so no other use of the client can observe the handle swap; receivers
/// taken earlier keep reading the old connection until it closes.
pub struct AprsIsClient {
    config: ClientConfig,
    connector: Box<dyn Connector>,
    http: Option<Box<dyn HttpPost>>,
    datagram: Box<dyn DatagramSend>,
    conn: Option<Connection>,
    stop: Arc<AtomicBool>,
}

impl AprsIsClient {
    pub fn new(config: ClientConfig) -> Self {
        #[cfg(feature = "http")]
        let http: Option<Box<dyn HttpPost>> =
            match crate::http::ReqwestPost::new(config.http_timeout) {
                Ok(post) => Some(Box::new(post)),
                Err(err) => {
                    warn!(error = %err, "http submission unavailable");
                    None
                }
            };
        #[cfg(not(feature = "http"))]
        let http: Option<Box<dyn HttpPost>> = None;

        let connector = TcpConnector {
            config: TcpConfig {
                connect_timeout: config.connect_timeout,
                ..TcpConfig::default()
            },
        };

        Self {
            config,
            connector: Box::new(connector),
            http,
            datagram: Box::new(UdpSender),
            conn: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replace how TCP connections are opened.
    pub fn with_connector(mut self, connector: impl Connector + 'static) -> Self {
        self.connector = Box::new(connector);
        self
    }

    /// Replace the HTTP collaborator.
    pub fn with_http(mut self, http: impl HttpPost + 'static) -> Self {
        self.http = Some(Box::new(http));
        self
    }

    /// Replace the UDP collaborator.
    pub fn with_datagram(mut self, datagram: impl DatagramSend + 'static) -> Self {
        self.datagram = Box::new(datagram);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Connect and log in. Unset arguments fall back to the configured
    /// server and port and to the `p/<user>` filter.
    ///
    /// An existing connection is closed first.
    pub fn connect(
        &mut self,
        server: Option<&str>,
        port: Option<u16>,
        filter: Option<&str>,
    ) -> Result<()> {
        self.close()?;
        let server = server.unwrap_or(&self.config.server).to_string();
        let port = port.unwrap_or(self.config.port);
        let conn = self.open_connection(server, port, filter.map(str::to_string))?;
        self.conn = Some(conn);
        Ok(())
    }

    fn open_connection(
        &self,
        server: String,
        port: u16,
        filter: Option<String>,
    ) -> Result<Connection> {
        let mut stream = self.connector.connect(&server, port)?;
        stream.set_stream_read_timeout(self.config.read_timeout)?;
        info!(%server, port, "connected to aprs-is");

        let credentials = &self.config.credentials;
        let mut login = credentials.login_line(filter.as_deref()).into_bytes();
        login.extend_from_slice(LINE_END);
        stream.write_all(&login)?;
        stream.flush()?;
        debug!(
            login = %credentials.redacted_login_line(filter.as_deref()),
            "aprs-is login sent"
        );

        Ok(Connection {
            stream,
            server,
            port,
            filter,
            lines: LineSplitter::default(),
        })
    }

    /// Submit `frame` in TNC2 text form.
    ///
    /// TCP requires a connection and reports `true` once the line is
    /// written. HTTP reports whether the server answered 204. UDP always
    /// reports `true` once the datagram leaves.
    pub fn send(&mut self, frame: &Frame, protocol: Protocol) -> Result<bool> {
        let text = frame.to_tnc2_bytes();
        match protocol {
            Protocol::Tcp => {
                let mut line = text;
                line.extend_from_slice(LINE_END);
                self.send_tcp(&line)?;
                debug!(frame = %frame, "frame sent to aprs-is over tcp");
                Ok(true)
            }
            Protocol::Http => {
                let http = self
                    .http
                    .as_deref()
                    .ok_or_else(|| AprsIsError::Http("no HTTP client configured".to_string()))?;
                let body = self.submission(&text);
                let status = http.post(&self.config.http_url, &body, &self.config.http_headers)?;
                let accepted = status == 204;
                if accepted {
                    debug!(frame = %frame, "frame sent to aprs-is over http");
                } else {
                    warn!(status, url = %self.config.http_url, "aprs-is http submission not accepted");
                }
                Ok(accepted)
            }
            Protocol::Udp => {
                let body = self.submission(&text);
                self.datagram
                    .send_to(&body, &self.config.server, self.config.udp_port)?;
                debug!(frame = %frame, "frame sent to aprs-is over udp");
                Ok(true)
            }
        }
    }

    fn submission(&self, text: &[u8]) -> Vec<u8> {
        let mut body = self.config.credentials.auth_line().into_bytes();
        body.push(b'\n');
        body.extend_from_slice(text);
        body
    }

    fn send_tcp(&mut self, line: &[u8]) -> Result<()> {
        let mut last_err = match self.write_current(line) {
            Ok(()) => return Ok(()),
            Err(err) if err.is_connection_lost() => err,
            Err(err) => return Err(err),
        };

        let mut attempts = 1u32;
        for delay in self.config.retry.delays() {
            warn!(
                attempt = attempts,
                error = %last_err,
                backoff_ms = delay.as_millis() as u64,
                "aprs-is connection lost; reconnecting"
            );
            attempts += 1;

            let reconnected = self.reconnect();
            std::thread::sleep(delay);
            match reconnected.and_then(|()| self.write_current(line)) {
                Ok(()) => {
                    info!(attempts, "aprs-is send succeeded after reconnect");
                    return Ok(());
                }
                Err(err) if err.is_connection_lost() => last_err = err,
                Err(err) => return Err(err),
            }
        }

        Err(AprsIsError::RetriesExhausted {
            attempts,
            source: Box::new(last_err),
        })
    }

    fn write_current(&mut self, line: &[u8]) -> Result<()> {
        let conn = self.conn.as_mut().ok_or(AprsIsError::NotConnected)?;
        conn.stream.write_all(line)?;
        conn.stream.flush()?;
        Ok(())
    }

    fn reconnect(&mut self) -> Result<()> {
        let (server, port, filter) = match &self.conn {
            Some(conn) => {
                if let Err(err) = conn.stream.close_stream() {
                    debug!(error = %err, "closing dropped aprs-is connection failed");
                }
                (conn.server.clone(), conn.port, conn.filter.clone())
            }
            None => return Err(AprsIsError::NotConnected),
        };
        let conn = self.open_connection(server, port, filter)?;
        self.conn = Some(conn);
        Ok(())
    }

    /// Pull mode: one read on the connection, returning the station lines
    /// it completed. Empty when the read timed out.
    pub fn read_lines(&mut self) -> Result<Vec<String>> {
        let conn = self.conn.as_mut().ok_or(AprsIsError::NotConnected)?;
        read_batch(conn.stream.as_mut(), &mut conn.lines)
    }

    /// Push mode: deliver station lines to `callback` until it breaks, the
    /// stop flag is set, or the server closes the connection. `#` lines are
    /// logged, never delivered. Socket errors are returned.
    pub fn receive<F>(&mut self, callback: F) -> Result<()>
    where
        F: FnMut(&str) -> ControlFlow<()>,
    {
        let conn = self.conn.as_mut().ok_or(AprsIsError::NotConnected)?;
        pump(conn.stream.as_mut(), &mut conn.lines, &self.stop, callback)
    }

    /// A receiver on a second handle to the current connection, for running
    /// the receive loop on another thread.
    pub fn receiver(&self) -> Result<AprsIsReceiver> {
        let conn = self.conn.as_ref().ok_or(AprsIsError::NotConnected)?;
        let stream = conn.stream.clone_stream()?;
        Ok(AprsIsReceiver::new(stream, Arc::clone(&self.stop)))
    }

    /// Flag that stops [`AprsIsClient::receive`] and every receiver taken
    /// from this client. Once set it stays set.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Shut the TCP connection down. Does nothing when not connected.
    pub fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.stream.close_stream()?;
            info!(server = %conn.server, port = conn.port, "aprs-is connection closed");
        }
        Ok(())
    }
}

impl Drop for AprsIsClient {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            debug!(error = %err, "aprs-is close on drop failed");
        }
    }
}

impl fmt::Debug for AprsIsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("AprsIsClient");
        dbg.field("config", &self.config);
        match &self.conn {
            Some(conn) => dbg.field("connected", &format_args!("{}:{}", conn.server, conn.port)),
            None => dbg.field("connected", &false),
        };
        dbg.finish()
    }
}

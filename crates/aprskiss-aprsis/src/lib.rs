//! Client for the APRS Internet Service.
//!
//! [`AprsIsClient`] logs in over TCP, submits [`aprskiss_ax25::Frame`]s as
//! TNC2 text over TCP, HTTP or UDP, and receives station lines. TCP sends
//! that find the connection dropped reconnect under a bounded
//! [`RetryPolicy`].
//!
//! Server lines starting with `#` are logged and never handed to callers.

pub mod client;
pub mod error;
pub mod http;
pub mod lines;
pub mod login;
pub mod receiver;
pub mod retry;
pub mod stream;
pub mod udp;

pub use client::{AprsIsClient, ClientConfig, Protocol, DEFAULT_FILTER_PORT, DEFAULT_SERVER};
pub use error::{AprsIsError, Result};
#[cfg(feature = "http")]
pub use http::ReqwestPost;
pub use http::{default_http_headers, HttpPost, DEFAULT_HTTP_URL};
pub use lines::{LineSplitter, DEFAULT_MAX_LINE_LEN};
pub use login::{parse_logresp, Credentials, LogResp, DEFAULT_CLIENT_ID, RECEIVE_ONLY_PASSCODE};
pub use receiver::{AprsIsReceiver, RECV_BUFFER_SIZE};
pub use retry::RetryPolicy;
pub use stream::{Connector, IsStream, TcpConnector};
pub use udp::{DatagramSend, UdpSender, DEFAULT_UDP_PORT};

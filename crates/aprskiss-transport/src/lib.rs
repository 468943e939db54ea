//! Byte-stream links to KISS TNCs.
//!
//! Provides one [`Link`] type over the two ways a TNC is usually attached:
//! - a serial port (USB virtual COM port or RS-232)
//! - a TCP socket (soundmodems, networked TNCs, `kissattach`-style bridges)
//!
//! This is the lowest layer of aprskiss. KISS framing and the TNC session
//! build on the [`Link`] type provided here.

pub mod error;
pub mod link;
pub mod serial;
pub mod tcp;

pub use error::{Result, TransportError};
pub use link::{Link, LinkConfig};
pub use serial::{open_serial, DataBits, FlowControl, Parity, SerialConfig, StopBits};
pub use tcp::{connect_tcp, TcpConfig, DEFAULT_CONNECT_TIMEOUT};

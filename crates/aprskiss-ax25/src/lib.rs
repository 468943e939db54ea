//! AX.25 UI frames and APRS addressing.
//!
//! - [`Callsign`]: one station identity and its 7-byte address encoding
//! - [`Frame`]: destination, source, digipeater path and payload, with the
//!   binary AX.25 form ([`Frame::encode`], [`decode_frame`]) and the TNC2
//!   text form used on APRS-IS
//! - [`format_latitude`] / [`format_longitude`]: position text helpers
//!
//! Payloads are opaque bytes; APRS payload formats are not interpreted.

pub mod callsign;
pub mod coord;
pub mod error;
pub mod frame;

pub use callsign::{Callsign, ADDRESS_LEN, MAX_BASE_LEN, MAX_SSID};
pub use coord::{format_latitude, format_longitude};
pub use error::{Ax25Error, Result};
pub use frame::{
    decode_frame, Frame, CONTROL_UI, MAX_ADDRESSES, MAX_PATH_HOPS, MIN_FRAME_LEN, PID_NETROM,
    PID_NO_LAYER3,
};

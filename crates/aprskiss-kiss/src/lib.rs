//! KISS framing for TNC byte streams.
//!
//! Every frame on the wire is:
//! - a `FEND` (0xC0) delimiter
//! - a one-byte command (0x00 for data)
//! - the payload, with `FEND` and `FESC` escaped
//! - a closing `FEND`
//!
//! [`KissReader`] reassembles frames from arbitrarily chunked reads and
//! [`KissWriter`] escapes and delimits outgoing payloads.

pub mod codec;
pub mod command;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    encode_command, encode_data_frame, escape, extract_data, unescape, Deframer, KissConfig,
    DEFAULT_MAX_FRAME_SIZE, FEND, FESC, TFEND, TFESC,
};
pub use command::{
    command_name, is_parameter, DATA_FRAME, FULL_DUPLEX, PERSISTENCE, RETURN, SET_HARDWARE,
    SLOT_TIME, TX_DELAY, TX_TAIL,
};
pub use error::{KissError, Result};
pub use reader::KissReader;
pub use writer::KissWriter;

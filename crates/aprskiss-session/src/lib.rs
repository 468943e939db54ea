//! TNC sessions over serial or TCP links.
//!
//! A [`TncSession`] owns one link. On open it can switch the TNC firmware
//! into KISS mode ([`ModeInit`]) and set channel-access parameters
//! ([`KissSettings`]); on close or drop it sends the mode-exit sequence and
//! releases the link.
//!
//! Reading is single-owner: only the session reads, in pull
//! ([`TncSession::read_frames`]) or push ([`TncSession::run`]) mode.
//! Writing goes through [`TncWriter`], a cloneable handle that serializes
//! frames so they never interleave on the wire.

pub mod error;
pub mod mode;
pub mod session;

pub use error::{Result, SessionError};
pub use mode::{KissSettings, ModeInit, MODE_END, MODE_INIT_LINKNORD, MODE_INIT_W8DED};
pub use session::{SessionConfig, TncSession, TncWriter, DEFAULT_POLL_INTERVAL};

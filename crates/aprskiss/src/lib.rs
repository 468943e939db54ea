//! Packet radio plumbing for APRS.
//!
//! aprskiss moves APRS traffic between a KISS TNC on a serial port or TCP
//! socket and the APRS-IS network.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial and TCP links to a TNC
//! - [`kiss`]: KISS framing, escaping and stream reassembly
//! - [`ax25`]: callsigns, AX.25 UI frames and their TNC2 text form
//! - [`session`]: TNC sessions with mode switching (behind `session` feature)
//! - [`aprsis`]: APRS-IS client (behind `aprsis` feature)

/// Re-export transport types.
pub mod transport {
    pub use aprskiss_transport::*;
}

/// Re-export KISS framing types.
pub mod kiss {
    pub use aprskiss_kiss::*;
}

/// Re-export AX.25 frame types.
pub mod ax25 {
    pub use aprskiss_ax25::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use aprskiss_session::*;
}

/// Re-export APRS-IS client types (requires `aprsis` feature).
#[cfg(feature = "aprsis")]
pub mod aprsis {
    pub use aprskiss_aprsis::*;
}

//! AX.25 UI frames as used by APRS.
//!
//! Wire layout of an encoded frame:
//! ```text
//! ┌──────────┬──────────┬─────────────────┬─────────┬──────┬─────────┐
//! │ dest (7) │ src (7)  │ path (0..=8 × 7)│ control │ PID  │ payload │
//! │          │          │                 │ 0x03    │ 0xF0 │         │
//! └──────────┴──────────┴─────────────────┴─────────┴──────┴─────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::callsign::{Callsign, ADDRESS_LEN, LAST_ADDRESS_BIT};
use crate::error::{Ax25Error, Result};

/// Control field of an unnumbered information (UI) frame.
pub const CONTROL_UI: u8 = 0x03;

/// PID for "no layer 3 protocol", the value APRS uses.
pub const PID_NO_LAYER3: u8 = 0xF0;

/// PID for NET/ROM, also accepted on decode.
pub const PID_NETROM: u8 = 0xCF;

/// Maximum number of digipeater hops in a path.
pub const MAX_PATH_HOPS: usize = 8;

/// Maximum number of addresses in the address field.
pub const MAX_ADDRESSES: usize = MAX_PATH_HOPS + 2;

/// Shortest buffer `decode_frame` will consider.
pub const MIN_FRAME_LEN: usize = 2 * ADDRESS_LEN + 3;

/// An APRS frame: addresses, digipeater path and opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub source: Callsign,
    pub destination: Callsign,
    /// Digipeater hops in route order.
    pub path: Vec<Callsign>,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(
        source: Callsign,
        destination: Callsign,
        path: Vec<Callsign>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            source,
            destination,
            path,
            payload: payload.into(),
        }
    }

    /// Encode as a raw AX.25 UI frame, ready for KISS framing.
    pub fn encode(&self) -> Result<Bytes> {
        let mut dst = BytesMut::new();
        self.encode_into(&mut dst)?;
        Ok(dst.freeze())
    }

    /// Encode as a raw AX.25 UI frame, appending to `dst`.
    pub fn encode_into(&self, dst: &mut BytesMut) -> Result<()> {
        if self.path.len() > MAX_PATH_HOPS {
            return Err(Ax25Error::TooManyHops {
                hops: self.path.len(),
                max: MAX_PATH_HOPS,
            });
        }

        let addresses = self.path.len() + 2;
        dst.reserve(addresses * ADDRESS_LEN + 2 + self.payload.len());

        let start = dst.len();
        dst.put_slice(&self.destination.encode());
        dst.put_slice(&self.source.encode());
        for hop in &self.path {
            dst.put_slice(&hop.encode());
        }
        let last = start + addresses * ADDRESS_LEN - 1;
        dst[last] |= LAST_ADDRESS_BIT;

        dst.put_u8(CONTROL_UI);
        dst.put_u8(PID_NO_LAYER3);
        dst.put_slice(&self.payload);
        Ok(())
    }

    /// Render in TNC2 text form: `SRC>DST,HOP1,HOP2*:payload`.
    ///
    /// Payload bytes that are not valid UTF-8 are replaced; use
    /// [`Frame::to_tnc2_bytes`] to keep them intact.
    pub fn to_tnc2(&self) -> String {
        String::from_utf8_lossy(&self.to_tnc2_bytes()).into_owned()
    }

    /// TNC2 text form with the payload bytes untouched.
    pub fn to_tnc2_bytes(&self) -> Vec<u8> {
        let mut header = format!("{}>{}", self.source, self.destination);
        for hop in &self.path {
            header.push(',');
            header.push_str(&hop.hop_display());
        }
        header.push(':');

        let mut out = header.into_bytes();
        out.extend_from_slice(&self.payload);
        out
    }

    /// Parse the TNC2 text form.
    ///
    /// The source ends at the first `>`, the address list at the next `:`.
    /// Everything after that colon is payload, colons included. A trailing
    /// CRLF is ignored.
    pub fn parse_tnc2(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (source, rest) = line
            .split_once('>')
            .ok_or_else(|| invalid_tnc2("missing '>' after source"))?;
        let (addresses, payload) = rest
            .split_once(':')
            .ok_or_else(|| invalid_tnc2("missing ':' before payload"))?;

        let mut elements = addresses.split(',');
        let destination = elements
            .next()
            .filter(|d| !d.is_empty())
            .ok_or_else(|| invalid_tnc2("missing destination"))?
            .parse::<Callsign>()?;
        let path = elements
            .map(Callsign::parse_hop)
            .collect::<Result<Vec<_>>>()?;
        if path.len() > MAX_PATH_HOPS {
            return Err(Ax25Error::TooManyHops {
                hops: path.len(),
                max: MAX_PATH_HOPS,
            });
        }

        Ok(Self {
            source: source.parse()?,
            destination,
            path,
            payload: Bytes::copy_from_slice(payload.as_bytes()),
        })
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_tnc2())
    }
}

impl FromStr for Frame {
    type Err = Ax25Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_tnc2(s)
    }
}

fn invalid_tnc2(reason: &str) -> Ax25Error {
    Ax25Error::InvalidTnc2 {
        reason: reason.to_string(),
    }
}

/// Locate and parse an AX.25 UI frame at the start of `raw`.
///
/// The address field has no length prefix, so every 7-byte boundary whose
/// last byte carries the last-address bit is probed, and the first one
/// followed by a UI control byte and a known PID wins. Returns `None` when
/// `raw` is shorter than [`MIN_FRAME_LEN`] or no boundary qualifies.
pub fn decode_frame(raw: &[u8]) -> Option<Frame> {
    if raw.len() < MIN_FRAME_LEN {
        trace!(len = raw.len(), "buffer too short for an ax.25 frame");
        return None;
    }

    for end in (ADDRESS_LEN - 1..raw.len()).step_by(ADDRESS_LEN) {
        let count = (end + 1) / ADDRESS_LEN;
        if count > MAX_ADDRESSES {
            break;
        }
        if raw[end] & LAST_ADDRESS_BIT == 0 || count < 2 {
            continue;
        }
        let (Some(&control), Some(&pid)) = (raw.get(end + 1), raw.get(end + 2)) else {
            break;
        };
        if control & 0x03 != CONTROL_UI || !matches!(pid, PID_NO_LAYER3 | PID_NETROM) {
            continue;
        }

        let addresses: Vec<Callsign> = raw[..=end]
            .chunks_exact(ADDRESS_LEN)
            .filter_map(Callsign::decode)
            .collect();
        let mut addresses = addresses.into_iter();
        let destination = addresses.next()?;
        let source = addresses.next()?;
        return Some(Frame {
            source,
            destination,
            path: addresses.collect(),
            payload: Bytes::copy_from_slice(&raw[end + 3..]),
        });
    }

    trace!(len = raw.len(), "no ax.25 address field boundary found");
    None
}

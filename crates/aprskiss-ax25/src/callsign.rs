//! Station identities and their 7-byte AX.25 address encoding.
//!
//! Address layout:
//! ```text
//! ┌────────────────────────────────┬──────────────────────────────┐
//! │ 6 bytes: callsign, space       │ SSID byte                    │
//! │ padded, each char << 1         │ H 1 1 S S S S E              │
//! └────────────────────────────────┴──────────────────────────────┘
//! ```
//! `H` is the has-been-digipeated bit, `SSSS` the SSID and `E` the
//! last-address marker, which only the frame encoder sets.

use std::fmt;
use std::str::FromStr;

use crate::error::{Ax25Error, Result};

/// Length of one encoded address.
pub const ADDRESS_LEN: usize = 7;

/// Maximum callsign length without SSID.
pub const MAX_BASE_LEN: usize = 6;

/// Highest SSID value.
pub const MAX_SSID: u8 = 15;

const SSID_RESERVED_BITS: u8 = 0x60;
const DIGIPEATED_BIT: u8 = 0x80;
pub(crate) const LAST_ADDRESS_BIT: u8 = 0x01;

/// A station identity: callsign, SSID and digipeated flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Callsign {
    base: String,
    ssid: u8,
    digipeated: bool,
}

impl Callsign {
    /// Build a validated callsign. Letters are upper-cased.
    pub fn new(base: &str, ssid: u8) -> Result<Self> {
        validate_base(base)?;
        if ssid > MAX_SSID {
            return Err(Ax25Error::InvalidSsid(ssid.to_string()));
        }
        Ok(Self {
            base: base.to_ascii_uppercase(),
            ssid,
            digipeated: false,
        })
    }

    /// Parse a path element such as `WIDE1-1*`; a trailing `*` marks the hop
    /// as digipeated.
    pub fn parse_hop(s: &str) -> Result<Self> {
        match s.strip_suffix('*') {
            Some(rest) => Ok(rest.parse::<Self>()?.with_digipeated(true)),
            None => s.parse(),
        }
    }

    /// The callsign without SSID.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn ssid(&self) -> u8 {
        self.ssid
    }

    pub fn is_digipeated(&self) -> bool {
        self.digipeated
    }

    /// Return a copy with the digipeated flag set to `digipeated`.
    pub fn with_digipeated(mut self, digipeated: bool) -> Self {
        self.digipeated = digipeated;
        self
    }

    /// Path-element form: the display form plus `*` when digipeated.
    pub fn hop_display(&self) -> String {
        if self.digipeated {
            format!("{self}*")
        } else {
            self.to_string()
        }
    }

    /// Encode into the 7-byte address field. The last-address bit is left
    /// clear.
    pub fn encode(&self) -> [u8; ADDRESS_LEN] {
        let mut out = [b' ' << 1; ADDRESS_LEN];
        for (slot, byte) in out.iter_mut().zip(self.base.bytes().take(MAX_BASE_LEN)) {
            *slot = byte << 1;
        }
        let mut ssid = (self.ssid << 1) | SSID_RESERVED_BITS;
        if self.digipeated {
            ssid |= DIGIPEATED_BIT;
        }
        out[MAX_BASE_LEN] = ssid;
        out
    }

    /// Decode the first 7 bytes of `raw`.
    ///
    /// No validation is applied beyond length: whatever a station put on the
    /// air is reported as received. Returns `None` when fewer than 7 bytes
    /// are available.
    pub fn decode(raw: &[u8]) -> Option<Self> {
        let field = raw.get(..ADDRESS_LEN)?;
        let base: String = field[..MAX_BASE_LEN]
            .iter()
            .map(|&b| char::from(b >> 1))
            .collect();
        let ssid_byte = field[MAX_BASE_LEN];
        Some(Self {
            base: base.trim_end_matches(' ').to_string(),
            ssid: (ssid_byte >> 1) & 0x0F,
            digipeated: ssid_byte & DIGIPEATED_BIT != 0,
        })
    }
}

impl fmt::Display for Callsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ssid > 0 {
            write!(f, "{}-{}", self.base, self.ssid)
        } else {
            f.write_str(&self.base)
        }
    }
}

impl FromStr for Callsign {
    type Err = Ax25Error;

    /// Parse the display form `BASE` or `BASE-SSID`.
    fn from_str(s: &str) -> Result<Self> {
        let (base, ssid) = match s.split_once('-') {
            None => (s, 0),
            Some((_, ssid)) if ssid.contains('-') => {
                return Err(Ax25Error::InvalidCallsign {
                    callsign: s.to_string(),
                    reason: "more than one '-'",
                })
            }
            Some((base, ssid)) => (base, parse_ssid(ssid)?),
        };
        Self::new(base, ssid)
    }
}

fn parse_ssid(s: &str) -> Result<u8> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Ax25Error::InvalidSsid(s.to_string()));
    }
    match s.parse::<u8>() {
        Ok(ssid) if ssid <= MAX_SSID => Ok(ssid),
        _ => Err(Ax25Error::InvalidSsid(s.to_string())),
    }
}

fn validate_base(base: &str) -> Result<()> {
    let reason = if base.len() < 2 {
        "shorter than 2 characters"
    } else if base.len() > MAX_BASE_LEN {
        "longer than 6 characters"
    } else if !base.bytes().all(|b| b.is_ascii_alphanumeric()) {
        "only letters and digits are allowed"
    } else {
        return Ok(());
    };
    Err(Ax25Error::InvalidCallsign {
        callsign: base.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_pads_and_shifts() {
        let call = Callsign::new("APRS", 0).unwrap();
        assert_eq!(
            call.encode(),
            [b'A' << 1, b'P' << 1, b'R' << 1, b'S' << 1, 0x40, 0x40, 0x60]
        );
    }

    #[test]
    fn encode_ssid_and_digipeated_bits() {
        let call = Callsign::new("WIDE2", 2).unwrap().with_digipeated(true);
        assert_eq!(call.encode()[6], 0x80 | 0x60 | (2 << 1));
    }

    #[test]
    fn decode_strips_padding_and_reads_flags() {
        let raw = [b'N' << 1, b'0' << 1, b'C' << 1, b'A' << 1, b'L' << 1, 0x40, 0xE1 | (7 << 1)];
        let call = Callsign::decode(&raw).unwrap();
        assert_eq!(call.base(), "N0CAL");
        assert_eq!(call.ssid(), 7);
        assert!(call.is_digipeated());
    }

    #[test]
    fn decode_needs_seven_bytes() {
        assert!(Callsign::decode(&[0x82; 6]).is_none());
    }

    #[test]
    fn encode_decode_round_trip() {
        for (base, ssid, digi) in [("AB", 0, false), ("WI2ARD", 1, true), ("K7X", 15, false)] {
            let call = Callsign::new(base, ssid).unwrap().with_digipeated(digi);
            assert_eq!(Callsign::decode(&call.encode()).unwrap(), call);
        }
    }

    #[test]
    fn display_round_trip() {
        for text in ["APRS", "WI2ARD-1", "WIDE2-2", "N0CALL-15"] {
            let call: Callsign = text.parse().unwrap();
            assert_eq!(call.to_string(), text);
        }
    }

    #[test]
    fn zero_ssid_is_not_displayed() {
        let call: Callsign = "KD6ABC-0".parse().unwrap();
        assert_eq!(call.ssid(), 0);
        assert_eq!(call.to_string(), "KD6ABC");
    }

    #[test]
    fn lowercase_is_normalized() {
        let call: Callsign = "wi2ard-1".parse().unwrap();
        assert_eq!(call.base(), "WI2ARD");
    }

    #[test]
    fn rejects_malformed_display_strings() {
        for bad in ["A", "TOOLONG7", "AB-C", "AB-16", "AB-", "AB-1-2", "A/B", "AB-001", ""] {
            assert!(bad.parse::<Callsign>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn rejects_ssid_out_of_range() {
        assert!(matches!(
            Callsign::new("AB", 16),
            Err(Ax25Error::InvalidSsid(_))
        ));
    }

    #[test]
    fn hop_display_marks_digipeated() {
        let hop = Callsign::parse_hop("WIDE1-1*").unwrap();
        assert!(hop.is_digipeated());
        assert_eq!(hop.to_string(), "WIDE1-1");
        assert_eq!(hop.hop_display(), "WIDE1-1*");

        let fresh = Callsign::parse_hop("WIDE2-2").unwrap();
        assert!(!fresh.is_digipeated());
        assert_eq!(fresh.hop_display(), "WIDE2-2");
    }
}

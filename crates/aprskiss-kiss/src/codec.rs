use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{trace, warn};

use crate::command::DATA_FRAME;

/// Frame end: delimits frames on the wire.
pub const FEND: u8 = 0xC0;
/// Frame escape: introduces a two-byte escape sequence.
pub const FESC: u8 = 0xDB;
/// Transposed frame end: `FESC TFEND` stands for a literal `FEND`.
pub const TFEND: u8 = 0xDC;
/// Transposed frame escape: `FESC TFESC` stands for a literal `FESC`.
pub const TFESC: u8 = 0xDD;

/// Default cap on a single frame still being reassembled: 64 KiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// Escape `FEND` and `FESC` bytes in `raw`, appending to `dst`.
pub fn escape(raw: &[u8], dst: &mut BytesMut) {
    dst.reserve(raw.len());
    for &byte in raw {
        match byte {
            FEND => dst.put_slice(&[FESC, TFEND]),
            FESC => dst.put_slice(&[FESC, TFESC]),
            other => dst.put_u8(other),
        }
    }
}

/// Restore escaped bytes to their literal values.
///
/// `FESC` followed by anything other than `TFEND`/`TFESC` is kept as is,
/// including a trailing `FESC` with nothing after it.
pub fn unescape(escaped: &[u8]) -> BytesMut {
    let mut out = BytesMut::with_capacity(escaped.len());
    let mut iter = escaped.iter().copied().peekable();
    while let Some(byte) = iter.next() {
        if byte != FESC {
            out.put_u8(byte);
            continue;
        }
        match iter.peek() {
            Some(&TFEND) => {
                out.put_u8(FEND);
                iter.next();
            }
            Some(&TFESC) => {
                out.put_u8(FESC);
                iter.next();
            }
            _ => out.put_u8(FESC),
        }
    }
    out
}

/// Encode a frame with an explicit command byte.
///
/// Wire format:
/// ```text
/// ┌──────┬─────────┬───────────────────┬──────┐
/// │ FEND │ command │ escaped payload   │ FEND │
/// │ 0xC0 │ (1B)    │                   │ 0xC0 │
/// └──────┴─────────┴───────────────────┴──────┘
/// ```
pub fn encode_command(command: u8, payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(payload.len() + 3);
    dst.put_u8(FEND);
    dst.put_u8(command);
    escape(payload, dst);
    dst.put_u8(FEND);
}

/// Encode a data frame carrying a raw AX.25 frame.
pub fn encode_data_frame(payload: &[u8], dst: &mut BytesMut) {
    encode_command(DATA_FRAME, payload, dst);
}

/// Unescape a completed frame and return its payload if it is a data frame.
///
/// Frames with any other command byte are not AX.25 traffic and yield `None`.
pub fn extract_data(raw: &[u8]) -> Option<Bytes> {
    let mut frame = unescape(raw);
    match frame.first() {
        Some(&DATA_FRAME) => {
            frame.advance(1);
            Some(frame.freeze())
        }
        Some(&command) => {
            trace!(command, len = frame.len(), "dropping non-data kiss frame");
            None
        }
        None => None,
    }
}

/// Configuration for KISS reading and writing.
#[derive(Debug, Clone)]
pub struct KissConfig {
    /// Maximum size of one frame, counted as the command byte plus the
    /// escaped payload, both while reassembling and when sending.
    /// Default: 64 KiB.
    pub max_frame_size: usize,
    /// Read timeout applied to the link.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout applied to the link.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for KissConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

/// Reassembles `FEND`-delimited frames from an arbitrarily chunked stream.
///
/// Bytes since the last delimiter are held in one accumulation buffer. Each
/// delimiter completes whatever has accumulated; empty segments (back-to-back
/// delimiters) carry no frame. The result depends only on the byte stream,
/// never on how it was split across reads.
#[derive(Debug)]
pub struct Deframer {
    buf: BytesMut,
    max_frame_size: usize,
    discarding: bool,
}

impl Deframer {
    /// Create a deframer that discards frames longer than `max_frame_size`.
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_frame_size,
            discarding: false,
        }
    }

    /// Feed newly received bytes, appending completed (still escaped) frames
    /// to `out`. Each frame still starts with its command byte.
    pub fn push(&mut self, chunk: &[u8], out: &mut Vec<Bytes>) {
        let mut start = 0usize;
        for (i, &byte) in chunk.iter().enumerate() {
            if byte == FEND {
                self.accumulate(&chunk[start..i]);
                self.complete(out);
                start = i + 1;
            }
        }
        self.accumulate(&chunk[start..]);
    }

    /// Number of bytes held for a frame not yet delimited.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Drop any partially received frame.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.discarding = false;
    }

    fn accumulate(&mut self, segment: &[u8]) {
        if self.discarding || segment.is_empty() {
            return;
        }
        if self.buf.len() + segment.len() > self.max_frame_size {
            warn!(
                size = self.buf.len() + segment.len(),
                max = self.max_frame_size,
                "kiss frame exceeds maximum size; discarding until next FEND"
            );
            self.buf.clear();
            self.discarding = true;
            return;
        }
        self.buf.extend_from_slice(segment);
    }

    fn complete(&mut self, out: &mut Vec<Bytes>) {
        if self.discarding {
            self.discarding = false;
            self.buf.clear();
            return;
        }
        if !self.buf.is_empty() {
            out.push(self.buf.split().freeze());
        }
    }
}

impl Default for Deframer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deframe_all(chunks: &[&[u8]]) -> Vec<Bytes> {
        let mut deframer = Deframer::default();
        let mut out = Vec::new();
        for chunk in chunks {
            deframer.push(chunk, &mut out);
        }
        out
    }

    #[test]
    fn escape_replaces_reserved_bytes() {
        let mut dst = BytesMut::new();
        escape(&[0x01, FEND, 0x02, FESC, 0x03], &mut dst);
        assert_eq!(
            dst.as_ref(),
            &[0x01, FESC, TFEND, 0x02, FESC, TFESC, 0x03]
        );
    }

    #[test]
    fn unescape_restores_reserved_bytes() {
        let mut escaped = BytesMut::new();
        let raw = [FESC, FEND, FESC, TFEND, FEND, FESC];
        escape(&raw, &mut escaped);
        assert_eq!(unescape(&escaped).as_ref(), &raw);
    }

    #[test]
    fn unescape_every_byte_value() {
        let raw: Vec<u8> = (0..=255u8).chain((0..=255u8).rev()).collect();
        let mut escaped = BytesMut::new();
        escape(&raw, &mut escaped);
        assert!(!escaped.contains(&FEND));
        assert_eq!(unescape(&escaped).as_ref(), raw.as_slice());
    }

    #[test]
    fn unescape_keeps_stray_escape() {
        assert_eq!(unescape(&[0x41, FESC, 0x42]).as_ref(), &[0x41, FESC, 0x42]);
        assert_eq!(unescape(&[0x41, FESC]).as_ref(), &[0x41, FESC]);
    }

    #[test]
    fn data_frame_layout() {
        let mut dst = BytesMut::new();
        encode_data_frame(b"AB", &mut dst);
        assert_eq!(dst.as_ref(), &[FEND, DATA_FRAME, b'A', b'B', FEND]);
    }

    #[test]
    fn command_frame_escapes_value() {
        let mut dst = BytesMut::new();
        encode_command(crate::command::TX_DELAY, &[FEND], &mut dst);
        assert_eq!(dst.as_ref(), &[FEND, 0x01, FESC, TFEND, FEND]);
    }

    #[test]
    fn extract_data_strips_command() {
        let payload = extract_data(&[DATA_FRAME, b'h', b'i']).unwrap();
        assert_eq!(payload.as_ref(), b"hi");
    }

    #[test]
    fn extract_data_drops_other_commands() {
        assert!(extract_data(&[crate::command::TX_DELAY, 40]).is_none());
        assert!(extract_data(&[]).is_none());
    }

    #[test]
    fn extract_data_unescapes_before_checking_command() {
        let payload = extract_data(&[DATA_FRAME, FESC, TFEND, 0x01]).unwrap();
        assert_eq!(payload.as_ref(), &[FEND, 0x01]);
    }

    #[test]
    fn two_frames_across_two_reads() {
        let stream = [FEND, 0x00, b'A', b'B', FEND, FEND, 0x00, b'C', FEND];
        for split in 0..=stream.len() {
            let (a, b) = stream.split_at(split);
            let frames = deframe_all(&[a, b]);
            assert_eq!(frames.len(), 2, "split at {split}");
            assert_eq!(extract_data(&frames[0]).unwrap().as_ref(), b"AB");
            assert_eq!(extract_data(&frames[1]).unwrap().as_ref(), b"C");
        }
    }

    #[test]
    fn chunking_does_not_change_result() {
        let mut wire = BytesMut::new();
        encode_data_frame(&[0x82, FEND, 0x40, FESC, 0x03, 0xF0], &mut wire);

        let whole = deframe_all(&[&wire]);
        let singles: Vec<&[u8]> = wire.chunks(1).collect();
        let one_by_one = deframe_all(&singles);
        let threes: Vec<&[u8]> = wire.chunks(3).collect();
        let by_three = deframe_all(&threes);

        assert_eq!(whole.len(), 1);
        assert_eq!(whole, one_by_one);
        assert_eq!(whole, by_three);
    }

    #[test]
    fn partial_frame_stays_pending() {
        let mut deframer = Deframer::default();
        let mut out = Vec::new();
        deframer.push(&[FEND, 0x00, b'x', b'y'], &mut out);
        assert!(out.is_empty());
        assert_eq!(deframer.pending(), 3);

        deframer.push(&[b'z', FEND], &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref(), &[0x00, b'x', b'y', b'z']);
        assert_eq!(deframer.pending(), 0);
    }

    #[test]
    fn back_to_back_delimiters_carry_no_frame() {
        let frames = deframe_all(&[&[FEND, FEND, FEND, 0x00, b'q', FEND, FEND]]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref(), &[0x00, b'q']);
    }

    #[test]
    fn oversized_frame_is_discarded_until_next_delimiter() {
        let mut deframer = Deframer::new(4);
        let mut out = Vec::new();
        deframer.push(&[FEND, 0x00, 1, 2, 3], &mut out);
        deframer.push(&[4, 5, 6, FEND], &mut out);
        assert!(out.is_empty());

        deframer.push(&[0x00, 7, FEND], &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref(), &[0x00, 7]);
    }

    #[test]
    fn reset_drops_partial_frame() {
        let mut deframer = Deframer::default();
        let mut out = Vec::new();
        deframer.push(&[FEND, 0x00, 1, 2], &mut out);
        deframer.reset();
        deframer.push(&[0x00, 9, FEND], &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref(), &[0x00, 9]);
    }
}

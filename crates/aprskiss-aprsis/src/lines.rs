use tracing::warn;

/// Line terminator used by APRS-IS in both directions.
pub const LINE_END: &[u8] = b"\r\n";

/// Default cap on a line still being reassembled.
pub const DEFAULT_MAX_LINE_LEN: usize = 16 * 1024;

/// Reassembles CRLF-terminated lines from an arbitrarily chunked stream.
///
/// A CR at the end of one chunk and the LF at the start of the next still
/// terminate the line. Empty lines are dropped. Bytes that are not UTF-8 are
/// replaced.
#[derive(Debug)]
pub struct LineSplitter {
    buf: Vec<u8>,
    max_line_len: usize,
    discarding: bool,
}

impl LineSplitter {
    pub fn new(max_line_len: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_line_len,
            discarding: false,
        }
    }

    /// Feed newly received bytes, appending completed lines to `out`.
    pub fn push(&mut self, chunk: &[u8], out: &mut Vec<String>) {
        // A split CRLF leaves the CR as the last buffered byte.
        let mut search_from = self.buf.len().saturating_sub(1);
        self.buf.extend_from_slice(chunk);

        let mut start = 0usize;
        while let Some(pos) = find_line_end(&self.buf[search_from..]) {
            let end = search_from + pos;
            if self.discarding {
                self.discarding = false;
            } else if end > start {
                out.push(String::from_utf8_lossy(&self.buf[start..end]).into_owned());
            }
            start = end + LINE_END.len();
            search_from = start;
        }
        self.buf.drain(..start);

        if self.buf.len() > self.max_line_len {
            warn!(
                size = self.buf.len(),
                max = self.max_line_len,
                "aprs-is line exceeds maximum length; discarding until next CRLF"
            );
            // Keep a trailing CR so a CRLF split across reads still ends the line.
            let keep_cr = self.buf.last() == Some(&b'\r');
            self.buf.clear();
            if keep_cr {
                self.buf.push(b'\r');
            }
            self.discarding = true;
        }
    }

    /// Number of bytes held for a line not yet terminated.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

impl Default for LineSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LEN)
    }
}

fn find_line_end(haystack: &[u8]) -> Option<usize> {
    haystack.windows(LINE_END.len()).position(|w| w == LINE_END)
}

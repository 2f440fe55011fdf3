use exporter_core::StreamApiError;

/// Longest unterminated line kept in memory. Posts are a few kilobytes.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Splits a chunked response body into lines.
///
/// Chunks may end anywhere, including inside a UTF-8 sequence or between
/// `\r` and `\n`; bytes are only decoded once a full line is buffered.
/// Blank keep-alive lines are dropped.
#[derive(Debug)]
pub struct LineDecoder {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already known to hold no newline.
    scanned: usize,
    max_line: usize,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            max_line: MAX_LINE_BYTES,
        }
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(mut self, max_line: usize) -> Self {
        self.max_line = max_line;
        self
    }

    /// Appends a chunk and returns the lines it completed. Fails once the
    /// pending unterminated line grows past the limit.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>, StreamApiError> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        let mut search = self.scanned;
        while let Some(offset) = self.buffer[search..].iter().position(|b| *b == b'\n') {
            let end = search + offset;
            if let Some(line) = decode_line(&self.buffer[start..end]) {
                lines.push(line);
            }
            start = end + 1;
            search = start;
        }

        self.buffer.drain(..start);
        self.scanned = self.buffer.len();

        if self.buffer.len() > self.max_line {
            return Err(StreamApiError::LineTooLong {
                limit: self.max_line,
            });
        }
        Ok(lines)
    }

    /// Returns whatever is left once the body has ended.
    pub fn finish(self) -> Option<String> {
        decode_line(&self.buffer)
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(bytes: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(bytes);
    let trimmed = line.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

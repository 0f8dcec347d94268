use serde_json::{Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::trace;

use crate::entry::Entry;
use crate::error::Result;

/// Decodes newline-delimited JSON into objects, one per line.
///
/// Lines that are blank, not valid JSON, or valid JSON but not an object are
/// skipped and counted; they never produce an error. Only I/O failures do.
pub struct LineDecoder<R> {
    reader: R,

    /// Reused line buffer
    buf: Vec<u8>,

    /// Lines read so far
    line_number: u64,

    /// Lines dropped without producing a value
    skipped: u64,
}

impl<R: AsyncBufRead + Unpin> LineDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_number: 0,
            skipped: 0,
        }
    }

    /// Read lines until one decodes to a JSON object. `Ok(None)` at end of input.
    pub async fn next_object(&mut self) -> Result<Option<Map<String, Value>>> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            match parse_object(&self.buf) {
                Some(object) => return Ok(Some(object)),
                None => {
                    self.skipped += 1;
                    trace!(line = self.line_number, "skipping undecodable line");
                }
            }
        }
    }

    /// Like [`next_object`](Self::next_object), but also skips objects
    /// without a string `logger` field.
    pub async fn next_entry(&mut self) -> Result<Option<Entry>> {
        while let Some(object) = self.next_object().await? {
            match Entry::from_object(object) {
                Some(entry) => return Ok(Some(entry)),
                None => {
                    self.skipped += 1;
                    trace!(line = self.line_number, "skipping record without logger");
                }
            }
        }
        Ok(None)
    }

    /// Lines read so far
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Lines skipped so far
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

/// Parse one line as a JSON object
pub fn parse_object(line: &[u8]) -> Option<Map<String, Value>> {
    let trimmed = line.trim_ascii();
    if !trimmed.starts_with(b"{") {
        return None;
    }

    match serde_json::from_slice(trimmed).ok()? {
        Value::Object(object) => Some(object),
        _ => None,
    }
}

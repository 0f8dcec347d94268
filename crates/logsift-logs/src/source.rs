use std::path::PathBuf;

use tokio::fs::File;
use tokio::io::BufReader;
use tracing::debug;

use crate::decoder::LineDecoder;
use crate::error::{LogError, Result};

/// Default read buffer for scans
pub const DEFAULT_READ_BUFFER: usize = 64 * 1024;

/// A newline-delimited JSON log file.
///
/// Every scan opens its own handle and reads from the start; nothing is
/// cached between scans.
#[derive(Clone, Debug)]
pub struct LogSource {
    path: PathBuf,
    read_buffer: usize,
}

impl LogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            read_buffer: DEFAULT_READ_BUFFER,
        }
    }

    /// Set the read buffer size (clamped to at least one byte)
    pub fn with_read_buffer(mut self, bytes: usize) -> Self {
        self.read_buffer = bytes.max(1);
        self
    }

    /// Open a fresh handle positioned at the start of the file
    pub async fn open(&self) -> Result<LineDecoder<BufReader<File>>> {
        let file = File::open(&self.path)
            .await
            .map_err(|source| LogError::SourceUnavailable {
                path: self.path.clone(),
                source,
            })?;
        debug!(path = %self.path.display(), "opened log source");

        Ok(LineDecoder::new(BufReader::with_capacity(
            self.read_buffer,
            file,
        )))
    }
}

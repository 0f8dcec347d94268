use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncBufRead;

use logsift_types::LogLevel;

use crate::decoder::LineDecoder;
use crate::error::Result;

/// Counts per log level
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    pub debug: usize,
    pub info: usize,
    pub warn: usize,
    pub error: usize,
    pub unknown: usize,
}

impl LevelCounts {
    pub fn increment(&mut self, level: LogLevel) {
        match level {
            LogLevel::Debug => self.debug += 1,
            LogLevel::Info => self.info += 1,
            LogLevel::Warn => self.warn += 1,
            LogLevel::Error => self.error += 1,
            LogLevel::Unknown => self.unknown += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.debug + self.info + self.warn + self.error + self.unknown
    }
}

/// Overview of a whole log source, built in one scan
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Records with a logger
    pub records: usize,

    /// Lines that produced no record
    pub skipped_lines: u64,

    pub loggers: BTreeMap<String, usize>,

    pub levels: LevelCounts,

    /// Earliest parseable record time
    pub earliest: Option<DateTime<Utc>>,

    /// Latest parseable record time
    pub latest: Option<DateTime<Utc>>,
}

impl Summary {
    fn observe_time(&mut self, ts: DateTime<Utc>) {
        self.earliest = Some(self.earliest.map_or(ts, |e| e.min(ts)));
        self.latest = Some(self.latest.map_or(ts, |l| l.max(ts)));
    }
}

pub async fn summarize<R>(decoder: &mut LineDecoder<R>) -> Result<Summary>
where
    R: AsyncBufRead + Unpin,
{
    let mut summary = Summary::default();

    while let Some(entry) = decoder.next_entry().await? {
        let record = entry.record();
        summary.records += 1;
        *summary.loggers.entry(record.logger().to_string()).or_default() += 1;
        summary.levels.increment(record.level());
        if let Some(ts) = record.timestamp() {
            summary.observe_time(ts);
        }
    }

    summary.skipped_lines = decoder.skipped();
    Ok(summary)
}

//! Rendering of query results on stdout

use std::collections::BTreeSet;
use std::io::{self, Write};

use anyhow::Result;

use logsift_logs::{LogLevel, Summary};

/// Print discovery results, one per line or as a JSON array
pub fn print_values(values: &BTreeSet<String>, json: bool) -> Result<()> {
    let mut out = io::stdout().lock();
    write_values(&mut out, values, json)?;
    out.flush()?;
    Ok(())
}

fn write_values(out: &mut impl Write, values: &BTreeSet<String>, json: bool) -> Result<()> {
    if json {
        serde_json::to_writer(&mut *out, values)?;
        writeln!(out)?;
    } else {
        for value in values {
            writeln!(out, "{value}")?;
        }
    }
    Ok(())
}

pub fn print_summary(summary: &Summary, json: bool) -> Result<()> {
    let mut out = io::stdout().lock();
    write_summary(&mut out, summary, json)?;
    out.flush()?;
    Ok(())
}

fn write_summary(out: &mut impl Write, summary: &Summary, json: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, summary)?;
        writeln!(out)?;
        return Ok(());
    }

    let format_time = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map(|t| t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
            .unwrap_or_else(|| "-".to_string())
    };

    writeln!(out, "records   {}", summary.records)?;
    writeln!(out, "skipped   {}", summary.skipped_lines)?;
    writeln!(out, "earliest  {}", format_time(summary.earliest))?;
    writeln!(out, "latest    {}", format_time(summary.latest))?;

    writeln!(out, "loggers")?;
    for (logger, count) in &summary.loggers {
        writeln!(out, "  {logger:<12} {count}")?;
    }

    let levels = &summary.levels;
    writeln!(out, "levels")?;
    for (level, count) in [
        (LogLevel::Debug, levels.debug),
        (LogLevel::Info, levels.info),
        (LogLevel::Warn, levels.warn),
        (LogLevel::Error, levels.error),
        (LogLevel::Unknown, levels.unknown),
    ] {
        writeln!(out, "  {:<12} {count}", level.as_str())?;
    }
    Ok(())
}

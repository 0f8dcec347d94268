use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use logsift_logs::{Attribute, LogService, LogSource, PredicateSet};

mod config;
mod output;

use config::Config;

/// Logsift - discovery queries and filtered streaming over JSON-lines logs
#[derive(Parser, Debug)]
#[command(name = "logsift")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to ./logsift.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log file to query, overriding the config
    #[arg(short, long, global = true, value_name = "PATH")]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List logger types present in the log
    Loggers {
        /// Print a JSON array
        #[arg(long)]
        json: bool,
    },
    /// List hosts of http records
    Hosts(DiscoveryArgs),
    /// List apps of console and cron records
    Apps(DiscoveryArgs),
    /// List schedules of cron records
    Schedules(DiscoveryArgs),
    /// List users of ssh records
    Users(DiscoveryArgs),
    /// List remote addresses (without port) of ssh records
    RemoteAddresses(DiscoveryArgs),
    /// Stream records of one logger matching every filter, as JSON lines
    Stream {
        /// Logger type to stream
        logger: String,

        /// Field filter, e.g. `request.path=/api` or `response.minLatency=250`
        #[arg(
            short = 'w',
            long = "where",
            value_name = "PATH=VALUE",
            value_parser = parse_filter
        )]
        filters: Vec<(String, String)>,
    },
    /// Count records per logger and level
    Summary {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Copy the raw log file to stdout
    Cat,
}

#[derive(clap::Args, Debug)]
struct DiscoveryArgs {
    /// Only consider records of this logger type
    #[arg(long)]
    logger: Option<String>,

    /// Print a JSON array
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(file) = &args.file {
        config.log_file = file.clone();
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(config.level_filter()?.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(args.command, &config).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run(command: Command, config: &Config) -> Result<()> {
    debug!(log_file = %config.log_file.display(), "using log source");
    let source = LogSource::new(config.log_file.clone()).with_read_buffer(config.read_buffer_bytes);
    let service = LogService::new(source);

    let (attribute, args) = match command {
        Command::Loggers { json } => {
            return output::print_values(&service.list_loggers().await, json);
        }
        Command::Hosts(args) => (Attribute::Hosts, args),
        Command::Apps(args) => (Attribute::Apps, args),
        Command::Schedules(args) => (Attribute::Schedules, args),
        Command::Users(args) => (Attribute::Users, args),
        Command::RemoteAddresses(args) => (Attribute::RemoteAddresses, args),
        Command::Stream { logger, filters } => {
            return stream(&service, &logger, collect_predicates(filters)).await;
        }
        Command::Summary { json } => {
            let summary = service.summarize().await?;
            return output::print_summary(&summary, json);
        }
        Command::Cat => return cat(&config.log_file).await,
    };

    let values = service.list(attribute, args.logger.as_deref()).await;
    output::print_values(&values, args.json)
}

/// Write matching records to stdout until the log ends, Ctrl-C, or stdout closes
async fn stream(service: &LogService, logger: &str, predicates: PredicateSet) -> Result<()> {
    let mut records = service.open_filtered_stream(logger, predicates).await?;

    let cancel = records.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let mut stdout = tokio::io::stdout();
    while let Some(line) = records.next().await {
        let line = line.context("Log stream failed")?;
        match stdout.write_all(&line).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                records.close();
                return Ok(());
            }
            Err(e) => return Err(e).context("Failed to write to stdout"),
        }
    }
    stdout.flush().await?;
    Ok(())
}

async fn cat(path: &std::path::Path) -> Result<()> {
    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    let mut stdout = tokio::io::stdout();
    tokio::io::copy(&mut file, &mut stdout).await?;
    stdout.flush().await?;
    Ok(())
}

/// Parse a `PATH=VALUE` filter argument
fn parse_filter(s: &str) -> Result<(String, String), String> {
    let (path, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PATH=VALUE, got '{s}'"))?;
    if path.is_empty() {
        return Err(format!("empty field path in '{s}'"));
    }
    Ok((path.to_string(), value.to_string()))
}

/// Build the predicate set, dropping empty values and `logger` keys.
/// A repeated path keeps its first position but takes the last value.
fn collect_predicates(filters: Vec<(String, String)>) -> PredicateSet {
    let mut ordered: Vec<(String, String)> = Vec::with_capacity(filters.len());
    for (path, value) in filters {
        if path == "logger" || value.is_empty() {
            continue;
        }
        match ordered.iter_mut().find(|(p, _)| *p == path) {
            Some(existing) => existing.1 = value,
            None => ordered.push((path, value)),
        }
    }
    PredicateSet::new(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use logsift_logs::Predicate;

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_filter("request.path=/api"),
            Ok(("request.path".to_string(), "/api".to_string()))
        );
        assert_eq!(
            parse_filter("msg=a=b"),
            Ok(("msg".to_string(), "a=b".to_string()))
        );
        assert!(parse_filter("msg").is_err());
        assert!(parse_filter("=x").is_err());
    }

    #[test]
    fn test_collect_predicates() {
        let filters = vec![
            ("logger".to_string(), "http".to_string()),
            ("response.status".to_string(), "200".to_string()),
            ("msg".to_string(), String::new()),
            ("response.status".to_string(), "404".to_string()),
        ];
        let set = collect_predicates(filters);
        assert_eq!(set.predicates(), &[Predicate::Status(Some(404))]);
    }

    #[test]
    fn test_cli_parses() {
        let args = Args::try_parse_from([
            "logsift",
            "--file",
            "x.jsonl",
            "stream",
            "http",
            "-w",
            "response.status=404",
            "--where",
            "msg=error",
        ])
        .unwrap();
        let Command::Stream { logger, filters } = args.command else {
            panic!("expected stream command");
        };
        assert_eq!(logger, "http");
        assert_eq!(filters.len(), 2);

        let args =
            Args::try_parse_from(["logsift", "remote-addresses", "--logger", "ssh"]).unwrap();
        assert!(matches!(
            args.command,
            Command::RemoteAddresses(DiscoveryArgs {
                logger: Some(_),
                json: false
            })
        ));
    }
}

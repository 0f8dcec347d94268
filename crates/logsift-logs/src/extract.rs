use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use tokio::io::AsyncBufRead;
use tracing::debug;

use logsift_types::LogRecord;

use crate::decoder::LineDecoder;
use crate::error::Result;

/// A field whose distinct values can be enumerated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    Loggers,
    Hosts,
    Apps,
    Schedules,
    Users,
    RemoteAddresses,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Self::Loggers,
        Self::Hosts,
        Self::Apps,
        Self::Schedules,
        Self::Users,
        Self::RemoteAddresses,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Loggers => "loggers",
            Self::Hosts => "hosts",
            Self::Apps => "apps",
            Self::Schedules => "schedules",
            Self::Users => "users",
            Self::RemoteAddresses => "remote-addresses",
        }
    }

    /// Whether a logger filter narrows this attribute. Logger discovery
    /// always sees every record.
    pub fn honors_logger_filter(&self) -> bool {
        !matches!(self, Self::Loggers)
    }

    /// Project this attribute out of a record.
    ///
    /// Only the logger kinds that define the attribute yield a value; absent
    /// and empty values yield `None`, except that an empty logger name is
    /// still listed as a logger.
    pub fn project<'a>(&self, record: &'a LogRecord) -> Option<&'a str> {
        let value = match (self, record) {
            (Self::Loggers, record) => Some(record.logger()),
            (Self::Hosts, LogRecord::Http(e)) => {
                e.request.as_ref().and_then(|r| r.host.as_deref())
            }
            (Self::Apps, LogRecord::Console(_) | LogRecord::Cron(_)) => record.app(),
            (Self::Schedules, LogRecord::Cron(e)) => e.schedule.as_deref(),
            (Self::Users, LogRecord::Ssh(e)) => e.user.as_deref(),
            (Self::RemoteAddresses, LogRecord::Ssh(e)) => e.remote_ip(),
            _ => None,
        };
        value.filter(|v| !v.is_empty() || *self == Self::Loggers)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| format!("unknown attribute: {s}"))
    }
}

/// Collect the distinct values of `attribute` across the whole source.
///
/// An empty `logger` is treated the same as no filter.
pub async fn extract_distinct<R>(
    decoder: &mut LineDecoder<R>,
    attribute: Attribute,
    logger: Option<&str>,
) -> Result<BTreeSet<String>>
where
    R: AsyncBufRead + Unpin,
{
    let logger = logger
        .filter(|l| !l.is_empty())
        .filter(|_| attribute.honors_logger_filter());
    let mut values = BTreeSet::new();

    while let Some(entry) = decoder.next_entry().await? {
        if logger.is_some_and(|l| entry.logger() != l) {
            continue;
        }
        if let Some(value) = attribute.project(entry.record()) {
            if !values.contains(value) {
                values.insert(value.to_string());
            }
        }
    }

    debug!(
        %attribute,
        distinct = values.len(),
        lines = decoder.line_number(),
        skipped = decoder.skipped(),
        "discovery scan finished"
    );
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = concat!(
        r#"{"time":"2024-01-15T10:00:00Z","level":"INFO","msg":"GET /","logger":"http","#,
        r#""request":{"host":"api.example.com","path":"/"},"#,
        r#""response":{"status":404,"latency":1000000}}"#,
        "\n",
        r#"{"logger":"http","request":{"host":"www.example.com"}}"#,
        "\n",
        r#"{"logger":"http","request":{"host":""}}"#,
        "\n",
        r#"{"logger":"console","app":"web","stream":"stdout"}"#,
        "\n",
        "not json{\n",
        r#"{"logger":"cron","app":"backup","schedule":"0 * * * *","args":["--full"]}"#,
        "\n",
        r#"{"logger":"cron","app":"backup","schedule":"*/5 * * * *"}"#,
        "\n",
        r#"{"logger":"ssh","user":"deploy","remote addr":"10.0.0.5:22022","command":["ls"]}"#,
        "\n",
        r#"{"logger":"ssh","user":"root","remote addr":"10.0.0.5:41000"}"#,
        "\n",
        r#"{"logger":"syslog","msg":"kernel"}"#,
        "\n",
        r#"{"msg":"no logger"}"#,
        "\n",
    );

    async fn distinct(attribute: Attribute, logger: Option<&str>) -> Vec<String> {
        let mut decoder = LineDecoder::new(LOG.as_bytes());
        extract_distinct(&mut decoder, attribute, logger)
            .await
            .unwrap()
            .into_iter()
            .collect()
    }

    #[tokio::test]
    async fn test_loggers_ignore_filter() {
        let all = distinct(Attribute::Loggers, None).await;
        assert_eq!(all, ["console", "cron", "http", "ssh", "syslog"]);
        assert_eq!(distinct(Attribute::Loggers, Some("http")).await, all);
    }

    #[tokio::test]
    async fn test_empty_logger_is_listed() {
        let input = concat!(
            r#"{"logger":"","request":{"host":""}}"#,
            "\n",
            r#"{"logger":"http"}"#,
            "\n",
        );
        let mut decoder = LineDecoder::new(input.as_bytes());
        let loggers = extract_distinct(&mut decoder, Attribute::Loggers, None)
            .await
            .unwrap();
        assert_eq!(loggers.into_iter().collect::<Vec<_>>(), ["", "http"]);
    }

    #[tokio::test]
    async fn test_hosts_exclude_empty() {
        assert_eq!(
            distinct(Attribute::Hosts, None).await,
            ["api.example.com", "www.example.com"]
        );
    }

    #[tokio::test]
    async fn test_apps_from_console_and_cron() {
        assert_eq!(distinct(Attribute::Apps, None).await, ["backup", "web"]);
        assert_eq!(distinct(Attribute::Apps, Some("cron")).await, ["backup"]);
    }

    #[tokio::test]
    async fn test_schedules_after_malformed_line() {
        assert_eq!(
            distinct(Attribute::Schedules, Some("cron")).await,
            ["*/5 * * * *", "0 * * * *"]
        );
    }

    #[tokio::test]
    async fn test_ssh_attributes() {
        assert_eq!(distinct(Attribute::Users, None).await, ["deploy", "root"]);
        assert_eq!(distinct(Attribute::RemoteAddresses, None).await, ["10.0.0.5"]);
    }

    #[tokio::test]
    async fn test_absent_logger_filter_is_empty() {
        for attribute in Attribute::ALL.into_iter().filter(|a| a.honors_logger_filter()) {
            assert!(distinct(attribute, Some("kafka")).await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_empty_filter_means_all() {
        assert_eq!(
            distinct(Attribute::Hosts, Some("")).await,
            distinct(Attribute::Hosts, None).await
        );
    }

    #[test]
    fn test_attribute_names() {
        for attribute in Attribute::ALL {
            assert_eq!(attribute.name().parse::<Attribute>(), Ok(attribute));
        }
        assert!("pods".parse::<Attribute>().is_err());
    }
}

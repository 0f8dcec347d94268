//! Shared types for logsift
//!
//! This crate contains the log record schema: a sum type discriminated by the
//! `logger` field, with one variant per known logger kind and a fallback for
//! everything else.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Lenient field decoding
// ============================================================================

/// Decode an optional field, treating a value of the wrong JSON type as absent
/// instead of rejecting the whole record.
mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(T::deserialize(value).ok())
    }
}

// ============================================================================
// Logger kinds
// ============================================================================

pub const HTTP_LOGGER: &str = "http";
pub const CONSOLE_LOGGER: &str = "console";
pub const CRON_LOGGER: &str = "cron";
pub const SSH_LOGGER: &str = "ssh";

/// Log severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Unknown,
}

impl LogLevel {
    /// Parse a level label, case-insensitively
    pub fn from_label(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "debug" | "dbg" => Self::Debug,
            "info" | "inf" => Self::Info,
            "warn" | "warning" | "wrn" => Self::Warn,
            "error" | "err" => Self::Error,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Output stream of a console record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleStream {
    Stdout,
    Stderr,
}

// ============================================================================
// Record variants
// ============================================================================

/// Fields carried by every record
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseEntry {
    pub logger: String,

    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub level: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub msg: Option<String>,
}

/// Request half of an HTTP access record
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub method: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub host: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub path: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub query: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub ip: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub referer: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub length: Option<u64>,
}

/// Response half of an HTTP access record
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<String>,
    /// Nanoseconds
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub latency: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<i64>,
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub length: Option<u64>,
}

impl HttpResponse {
    /// Latency in milliseconds
    pub fn latency_ms(&self) -> Option<f64> {
        self.latency.map(|ns| ns / 1_000_000.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpEntry {
    #[serde(flatten)]
    pub base: BaseEntry,
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub request: Option<HttpRequest>,
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub response: Option<HttpResponse>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsoleEntry {
    #[serde(flatten)]
    pub base: BaseEntry,
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub app: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub stream: Option<ConsoleStream>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CronEntry {
    #[serde(flatten)]
    pub base: BaseEntry,
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub app: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub args: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub schedule: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SshEntry {
    #[serde(flatten)]
    pub base: BaseEntry,
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub user: Option<String>,
    /// "ip:port"
    #[serde(
        rename = "remote addr",
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub remote_addr: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub command: Option<Vec<String>>,
}

impl SshEntry {
    /// Remote address with the port suffix stripped
    pub fn remote_ip(&self) -> Option<&str> {
        let addr = self.remote_addr.as_deref()?;
        let ip = addr.split(':').next().unwrap_or(addr);
        (!ip.is_empty()).then_some(ip)
    }

    /// Command and arguments joined by single spaces
    pub fn command_line(&self) -> Option<String> {
        self.command.as_ref().map(|parts| parts.join(" "))
    }
}

// ============================================================================
// Log record
// ============================================================================

/// A decoded log record, discriminated by its `logger` field
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LogRecord {
    Http(HttpEntry),
    Console(ConsoleEntry),
    Cron(CronEntry),
    Ssh(SshEntry),
    /// Any record whose logger is not one of the known kinds
    Base(BaseEntry),
}

impl LogRecord {
    /// Interpret a JSON value as a log record.
    ///
    /// Returns `None` when the value is not an object or has no string
    /// `logger` field. Known loggers decode into their variant; fields with
    /// the wrong type are left empty rather than failing the record.
    pub fn from_value(value: &Value) -> Option<Self> {
        let logger = value.as_object()?.get("logger")?.as_str()?;

        let typed = match logger {
            HTTP_LOGGER => HttpEntry::deserialize(value).ok().map(Self::Http),
            CONSOLE_LOGGER => ConsoleEntry::deserialize(value).ok().map(Self::Console),
            CRON_LOGGER => CronEntry::deserialize(value).ok().map(Self::Cron),
            SSH_LOGGER => SshEntry::deserialize(value).ok().map(Self::Ssh),
            _ => None,
        };

        typed.or_else(|| BaseEntry::deserialize(value).ok().map(Self::Base))
    }

    /// Common fields
    pub fn base(&self) -> &BaseEntry {
        match self {
            Self::Http(e) => &e.base,
            Self::Console(e) => &e.base,
            Self::Cron(e) => &e.base,
            Self::Ssh(e) => &e.base,
            Self::Base(e) => e,
        }
    }

    pub fn logger(&self) -> &str {
        &self.base().logger
    }

    pub fn msg(&self) -> Option<&str> {
        self.base().msg.as_deref()
    }

    /// Parsed severity, `Unknown` when absent
    pub fn level(&self) -> LogLevel {
        self.base()
            .level
            .as_deref()
            .map(LogLevel::from_label)
            .unwrap_or(LogLevel::Unknown)
    }

    /// Parse the `time` field as RFC 3339
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let time = self.base().time.as_deref()?;
        DateTime::parse_from_rfc3339(time)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }

    /// Application name, for the kinds that carry one
    pub fn app(&self) -> Option<&str> {
        match self {
            Self::Console(e) => e.app.as_deref(),
            Self::Cron(e) => e.app.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_http_record() {
        let value = json!({
            "time": "2024-01-15T10:30:00Z",
            "level": "INFO",
            "msg": "request served",
            "logger": "http",
            "request": {"host": "api.example.com", "path": "/v1/users", "ip": "10.1.2.3"},
            "response": {"latency": 12_500_000u64, "status": 404}
        });

        let Some(LogRecord::Http(entry)) = LogRecord::from_value(&value) else {
            panic!("expected http record");
        };
        let request = entry.request.unwrap();
        assert_eq!(request.host.as_deref(), Some("api.example.com"));
        let response = entry.response.unwrap();
        assert_eq!(response.status, Some(404));
        assert_eq!(response.latency_ms(), Some(12.5));
    }

    #[test]
    fn test_missing_logger_is_rejected() {
        assert!(LogRecord::from_value(&json!({"msg": "hello"})).is_none());
        assert!(LogRecord::from_value(&json!({"logger": 7})).is_none());
        assert!(LogRecord::from_value(&json!("http")).is_none());
    }

    #[test]
    fn test_unknown_logger_is_base() {
        let record = LogRecord::from_value(&json!({"logger": "syslog", "msg": "boot"})).unwrap();
        assert!(matches!(record, LogRecord::Base(_)));
        assert_eq!(record.logger(), "syslog");
        assert_eq!(record.msg(), Some("boot"));
    }

    #[test]
    fn test_wrong_typed_fields_are_absent() {
        let value = json!({
            "logger": "cron",
            "msg": 42,
            "app": ["not", "a", "string"],
            "schedule": "0 * * * *"
        });
        let Some(LogRecord::Cron(entry)) = LogRecord::from_value(&value) else {
            panic!("expected cron record");
        };
        assert_eq!(entry.base.msg, None);
        assert_eq!(entry.app, None);
        assert_eq!(entry.schedule.as_deref(), Some("0 * * * *"));
    }

    #[test]
    fn test_float_latency() {
        let value = json!({"logger": "http", "response": {"latency": 2.5e8, "status": 200}});
        let Some(LogRecord::Http(entry)) = LogRecord::from_value(&value) else {
            panic!("expected http record");
        };
        assert_eq!(entry.response.unwrap().latency_ms(), Some(250.0));
    }

    #[test]
    fn test_http_request_not_an_object() {
        let value = json!({"logger": "http", "request": "GET /"});
        let Some(LogRecord::Http(entry)) = LogRecord::from_value(&value) else {
            panic!("expected http record");
        };
        assert!(entry.request.is_none());
    }

    #[test]
    fn test_ssh_remote_ip() {
        let value = json!({
            "logger": "ssh",
            "user": "deploy",
            "remote addr": "10.0.0.5:22022",
            "command": ["git", "pull", "--ff-only"]
        });
        let Some(LogRecord::Ssh(entry)) = LogRecord::from_value(&value) else {
            panic!("expected ssh record");
        };
        assert_eq!(entry.remote_ip(), Some("10.0.0.5"));
        assert_eq!(entry.command_line().as_deref(), Some("git pull --ff-only"));

        let empty = SshEntry {
            remote_addr: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(empty.remote_ip(), None);
    }

    #[test]
    fn test_console_stream() {
        let value = json!({"logger": "console", "app": "web", "stream": "stderr"});
        let Some(LogRecord::Console(entry)) = LogRecord::from_value(&value) else {
            panic!("expected console record");
        };
        assert_eq!(entry.stream, Some(ConsoleStream::Stderr));

        let value = json!({"logger": "console", "stream": "tty"});
        let Some(LogRecord::Console(entry)) = LogRecord::from_value(&value) else {
            panic!("expected console record");
        };
        assert_eq!(entry.stream, None);
    }

    #[test]
    fn test_level_and_timestamp() {
        let record = LogRecord::from_value(&json!({
            "logger": "console",
            "level": "warn",
            "time": "2024-01-15T10:30:00.123+02:00"
        }))
        .unwrap();
        assert_eq!(record.level(), LogLevel::Warn);
        assert!(record.timestamp().is_some());

        let record =
            LogRecord::from_value(&json!({"logger": "console", "time": "yesterday"})).unwrap();
        assert_eq!(record.level(), LogLevel::Unknown);
        assert!(record.timestamp().is_none());
    }

    #[test]
    fn test_serialize_typed_record() {
        let record = LogRecord::from_value(&json!({
            "logger": "ssh",
            "remote addr": "1.2.3.4:22",
            "user": "root"
        }))
        .unwrap();
        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["remote addr"], "1.2.3.4:22");
        assert_eq!(out["logger"], "ssh");
        assert!(out.get("command").is_none());
    }
}

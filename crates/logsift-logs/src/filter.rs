use serde_json::Value;

use logsift_types::LogRecord;

use crate::entry::Entry;

/// One compiled `(field-path, expected)` predicate.
///
/// Well-known paths get bespoke semantics; every other path is an exact
/// comparison against a nested lookup into the raw record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    /// `msg`: case-insensitive substring (needle stored lowercased)
    Message(String),

    /// `request.path`: case-insensitive substring, http only
    RequestPath(String),

    /// `request.ip`: case-sensitive substring, http only
    RequestIp(String),

    /// `response.minLatency`: latency in milliseconds at least this, http only.
    /// `None` when the expected value did not parse.
    MinLatencyMs(Option<i64>),

    /// `response.status`: exact status code, http only
    Status(Option<i64>),

    /// `remote-addr`: exact match on the address without its port, ssh only
    RemoteAddr(String),

    /// `command`: case-insensitive substring of the space-joined command, ssh only
    Command(String),

    /// Any other path
    FieldEquals { path: String, expected: String },
}

impl Predicate {
    /// Compile a predicate from its field path and expected value
    pub fn compile(path: &str, expected: &str) -> Self {
        match path {
            "msg" => Self::Message(expected.to_lowercase()),
            "request.path" => Self::RequestPath(expected.to_lowercase()),
            "request.ip" => Self::RequestIp(expected.to_string()),
            "response.minLatency" => Self::MinLatencyMs(parse_int(expected)),
            "response.status" => Self::Status(parse_int(expected)),
            "remote-addr" => Self::RemoteAddr(expected.to_string()),
            "command" => Self::Command(expected.to_lowercase()),
            _ => Self::FieldEquals {
                path: path.to_string(),
                expected: expected.to_string(),
            },
        }
    }

    /// Check if an entry satisfies this predicate
    pub fn matches(&self, entry: &Entry) -> bool {
        let record = entry.record();
        match (self, record) {
            (Self::Message(needle), _) => record
                .msg()
                .is_some_and(|msg| msg.to_lowercase().contains(needle.as_str())),

            (Self::RequestPath(needle), LogRecord::Http(e)) => e
                .request
                .as_ref()
                .and_then(|r| r.path.as_deref())
                .is_some_and(|path| path.to_lowercase().contains(needle.as_str())),

            (Self::RequestIp(needle), LogRecord::Http(e)) => e
                .request
                .as_ref()
                .and_then(|r| r.ip.as_deref())
                .is_some_and(|ip| ip.contains(needle.as_str())),

            (Self::MinLatencyMs(threshold), LogRecord::Http(e)) => {
                match (threshold, e.response.as_ref().and_then(|r| r.latency_ms())) {
                    (Some(threshold), Some(latency_ms)) => latency_ms >= *threshold as f64,
                    _ => false,
                }
            }

            (Self::Status(expected), LogRecord::Http(e)) => {
                let status = e.response.as_ref().and_then(|r| r.status);
                expected.is_some() && status == *expected
            }

            (Self::RemoteAddr(expected), LogRecord::Ssh(e)) => {
                e.remote_ip() == Some(expected.as_str())
            }

            (Self::Command(needle), LogRecord::Ssh(e)) => e
                .command_line()
                .is_some_and(|line| line.to_lowercase().contains(needle.as_str())),

            (Self::FieldEquals { path, expected }, _) => entry
                .lookup(path)
                .is_some_and(|value| leaf_equals(value, expected)),

            // Bespoke paths on the wrong logger kind
            _ => false,
        }
    }
}

/// Compare a JSON leaf against a string. Numbers and booleans compare by
/// their JSON text; null, arrays and objects never match.
fn leaf_equals(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        Value::Bool(b) => b.to_string() == expected,
        _ => false,
    }
}

fn parse_int(s: &str) -> Option<i64> {
    s.trim().parse().ok()
}

/// A conjunction of predicates, compiled once per query
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PredicateSet {
    predicates: Vec<Predicate>,
}

impl PredicateSet {
    /// Compile `(path, expected)` pairs
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self {
            predicates: pairs
                .into_iter()
                .map(|(path, expected)| Predicate::compile(path.as_ref(), expected.as_ref()))
                .collect(),
        }
    }

    /// Check if an entry satisfies every predicate (vacuously true when empty)
    pub fn matches(&self, entry: &Entry) -> bool {
        self.predicates.iter().all(|p| p.matches(entry))
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

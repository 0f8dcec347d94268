use serde_json::{Map, Value};

use logsift_types::LogRecord;

use crate::error::Result;

/// A decoded line: the raw JSON object plus its typed record view.
///
/// The raw object is kept so that matched records are re-emitted exactly as
/// they appeared in the source, including fields the schema does not model.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    raw: Value,
    record: LogRecord,
}

impl Entry {
    /// Wrap a decoded object, or `None` if it has no string `logger`
    pub fn from_object(object: Map<String, Value>) -> Option<Self> {
        let raw = Value::Object(object);
        let record = LogRecord::from_value(&raw)?;
        Some(Self { raw, record })
    }

    pub fn record(&self) -> &LogRecord {
        &self.record
    }

    pub fn logger(&self) -> &str {
        self.record.logger()
    }

    /// Look up a dot-separated path through nested objects.
    ///
    /// Traversal stops with `None` as soon as an intermediate value is not an
    /// object; arrays are not indexed.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.raw, |current, key| current.as_object()?.get(key))
    }

    /// Encode as one newline-terminated JSON line
    pub fn to_line(&self) -> Result<Vec<u8>> {
        let mut line = serde_json::to_vec(&self.raw)?;
        line.push(b'\n');
        Ok(line)
    }
}

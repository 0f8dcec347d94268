//! Log processing for logsift
//!
//! This crate decodes newline-delimited JSON logs and answers two kinds of
//! query over them: discovery of distinct field values, and filtered
//! streaming of whole records. Every query is a fresh sequential scan of the
//! source.

mod decoder;
mod entry;
mod error;
mod extract;
mod filter;
mod service;
mod source;
mod stream;
mod summary;

pub use decoder::{LineDecoder, parse_object};
pub use entry::Entry;
pub use error::{LogError, Result};
pub use extract::{Attribute, extract_distinct};
pub use filter::{Predicate, PredicateSet};
pub use service::LogService;
pub use source::{DEFAULT_READ_BUFFER, LogSource};
pub use stream::{FilteredStream, open_filtered_stream};
pub use summary::{LevelCounts, Summary, summarize};

// Re-export types used in our public API
pub use logsift_types::{LogLevel, LogRecord};

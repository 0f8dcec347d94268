use std::collections::BTreeSet;

use tracing::warn;

use crate::error::Result;
use crate::extract::{Attribute, extract_distinct};
use crate::filter::PredicateSet;
use crate::source::LogSource;
use crate::stream::{FilteredStream, open_filtered_stream};
use crate::summary::{Summary, summarize};

/// Query entry point for a calling layer.
///
/// Discovery queries never fail: a source that cannot be read is logged and
/// reported as an empty set. Streaming and summaries propagate errors.
#[derive(Clone, Debug)]
pub struct LogService {
    source: LogSource,
}

impl LogService {
    pub fn new(source: LogSource) -> Self {
        Self { source }
    }

    /// Distinct values of `attribute`, optionally scoped to one logger
    pub async fn list(&self, attribute: Attribute, logger: Option<&str>) -> BTreeSet<String> {
        match self.try_list(attribute, logger).await {
            Ok(values) => values,
            Err(err) => {
                warn!(%attribute, error = %err, "discovery query failed");
                BTreeSet::new()
            }
        }
    }

    async fn try_list(
        &self,
        attribute: Attribute,
        logger: Option<&str>,
    ) -> Result<BTreeSet<String>> {
        let mut decoder = self.source.open().await?;
        extract_distinct(&mut decoder, attribute, logger).await
    }

    pub async fn list_loggers(&self) -> BTreeSet<String> {
        self.list(Attribute::Loggers, None).await
    }

    pub async fn list_hosts(&self, logger: Option<&str>) -> BTreeSet<String> {
        self.list(Attribute::Hosts, logger).await
    }

    pub async fn list_apps(&self, logger: Option<&str>) -> BTreeSet<String> {
        self.list(Attribute::Apps, logger).await
    }

    pub async fn list_schedules(&self, logger: Option<&str>) -> BTreeSet<String> {
        self.list(Attribute::Schedules, logger).await
    }

    pub async fn list_users(&self, logger: Option<&str>) -> BTreeSet<String> {
        self.list(Attribute::Users, logger).await
    }

    pub async fn list_remote_addresses(&self, logger: Option<&str>) -> BTreeSet<String> {
        self.list(Attribute::RemoteAddresses, logger).await
    }

    /// Stream records of `logger` matching every predicate
    pub async fn open_filtered_stream(
        &self,
        logger: &str,
        predicates: PredicateSet,
    ) -> Result<FilteredStream> {
        open_filtered_stream(&self.source, logger, predicates).await
    }

    pub async fn summarize(&self) -> Result<Summary> {
        let mut decoder = self.source.open().await?;
        summarize(&mut decoder).await
    }
}

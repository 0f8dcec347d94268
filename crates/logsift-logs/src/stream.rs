use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use tokio::io::AsyncBufRead;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::decoder::LineDecoder;
use crate::error::Result;
use crate::filter::PredicateSet;
use crate::source::LogSource;

/// Scan state owned by a running stream. Dropping it releases the reader.
struct Scan<R> {
    decoder: LineDecoder<R>,
    logger: String,
    predicates: PredicateSet,
    cancel: CancellationToken,
    emitted: u64,
}

impl<R: AsyncBufRead + Unpin> Scan<R> {
    /// Advance to the next matching record and encode it
    async fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            let next = tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    debug!(
                        logger = %self.logger,
                        emitted = self.emitted,
                        "filtered stream cancelled"
                    );
                    return Ok(None);
                }

                next = self.decoder.next_entry() => next?,
            };

            let Some(entry) = next else {
                debug!(
                    logger = %self.logger,
                    emitted = self.emitted,
                    lines = self.decoder.line_number(),
                    skipped = self.decoder.skipped(),
                    "filtered stream exhausted"
                );
                return Ok(None);
            };

            if entry.logger() != self.logger || !self.predicates.matches(&entry) {
                continue;
            }

            self.emitted += 1;
            return entry.to_line().map(Some);
        }
    }
}

/// A lazy stream of newline-terminated JSON records matching one logger and
/// a predicate set, in source order.
///
/// Records are read only as the consumer polls, so a slow consumer pauses
/// the scan. The stream closes on end of input, after yielding a read
/// error, when cancelled, or when dropped; the reader is released in every
/// case.
pub struct FilteredStream {
    inner: BoxStream<'static, Result<Vec<u8>>>,
    cancel: CancellationToken,
}

impl FilteredStream {
    pub fn new<R>(
        decoder: LineDecoder<R>,
        logger: impl Into<String>,
        predicates: PredicateSet,
    ) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let scan = Scan {
            decoder,
            logger: logger.into(),
            predicates,
            cancel: cancel.clone(),
            emitted: 0,
        };

        let inner = futures::stream::try_unfold(scan, |mut scan| async move {
            Ok(scan.next_line().await?.map(|line| (line, scan)))
        })
        .boxed();

        Self { inner, cancel }
    }

    /// Token that stops the stream when cancelled, even from another task
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop producing and release the reader immediately
    pub fn close(&mut self) {
        self.cancel.cancel();
        self.inner = futures::stream::empty().boxed();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Stream for FilteredStream {
    type Item = Result<Vec<u8>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for FilteredStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredStream")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Open the source and start a filtered stream over it.
///
/// Fails immediately if the source cannot be opened.
pub async fn open_filtered_stream(
    source: &LogSource,
    logger: &str,
    predicates: PredicateSet,
) -> Result<FilteredStream> {
    let decoder = source.open().await?;
    debug!(logger, predicates = predicates.len(), "opening filtered stream");
    Ok(FilteredStream::new(decoder, logger, predicates))
}

//! Paginated fetching.
//!
//! A [`PaginatedFetcher`] turns one find query into an unbounded record
//! stream by sending it repeatedly with increasing `-skip` values. A page
//! shorter than the page size is the last one.
//!
//! Two strategies produce the same stream:
//!
//! - [`PageStrategy::Sequential`] fetches the next page only once the
//!   previous one has been consumed.
//! - [`PageStrategy::Background`] fetches pages in a spawned task that feeds
//!   a bounded channel, so downloading overlaps with the caller's processing.
//!   Pages are still fetched one at a time, in order. The task is spawned on
//!   the first poll of the stream, which must happen inside a tokio runtime.
//!
//! Each response body is read whole before it is decoded, so memory holds at
//! most one page of raw XML at a time, plus up to `capacity` decoded records
//! in background mode.

use std::io::Cursor;
use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use async_stream::try_stream;
use futures::Stream;
use log::debug;
use log::info;
use log::warn;
use tokio::sync::mpsc;
use url::Url;

use crate::api::query::Arg;
use crate::api::query::Query;
use crate::decode::Decoder;
use crate::error::Error;
use crate::error::ValidationError;
use crate::meta::MetadataRegistry;
use crate::model::Record;
use crate::transport::Requester;

/// Default channel capacity for background pagination.
pub const DEFAULT_CAPACITY: usize = 1024;

/// A boxed stream of decoded records.
pub type RecordStream = Pin<Box<dyn Stream<Item = Result<Record, Error>> + Send>>;

/// How pages are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStrategy {
    /// Fetch on demand, in the consumer's task.
    Sequential,
    /// Fetch in a spawned task, buffering up to `capacity` records.
    Background { capacity: usize },
}

impl PageStrategy {
    /// Background fetching with the given buffer size (at least 1).
    pub fn background(capacity: usize) -> Self {
        Self::Background {
            capacity: capacity.max(1),
        }
    }
}

impl Default for PageStrategy {
    fn default() -> Self {
        Self::Background {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Messages from the background producer.
enum PageMessage {
    Record(Record),
    Done,
    Failed(Error),
}

/// Why the background producer stopped early.
enum Stop {
    Closed,
    Failed(Error),
}

/// Sends a query page after page and decodes every response.
#[derive(Clone)]
pub struct PaginatedFetcher {
    requester: Arc<dyn Requester>,
    endpoint: Url,
    registry: MetadataRegistry,
    strategy: PageStrategy,
}

impl PaginatedFetcher {
    /// Creates a fetcher sending requests to `endpoint`.
    ///
    /// Each page is decoded with a copy of `registry` (usually an empty
    /// registry carrying the cast map and server timezone).
    pub fn new(requester: Arc<dyn Requester>, endpoint: Url, registry: MetadataRegistry) -> Self {
        Self {
            requester,
            endpoint,
            registry,
            strategy: PageStrategy::default(),
        }
    }

    /// Sets the fetching strategy.
    pub fn strategy(mut self, strategy: PageStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Streams every record matching `query`, `page_size` records per request.
    ///
    /// Fails before any request if `page_size` is 0, if the action doesn't
    /// accept `-skip`/`-max`, or if `query` already sets one of them.
    ///
    /// No request is sent until the stream is polled.
    pub fn fetch(&self, query: Query, page_size: u64) -> Result<RecordStream, Error> {
        if page_size == 0 {
            return Err(ValidationError::InvalidPageSize.into());
        }
        if !query.action().pages() {
            return Err(ValidationError::NotPageable(query.action().wire_name()).into());
        }
        if query.has_arg(Arg::Skip) || query.has_arg(Arg::Max) {
            return Err(ValidationError::PaginationConflict.into());
        }
        // Validate the grammar once, up front.
        query.encode()?;

        let pager = Pager {
            requester: self.requester.clone(),
            endpoint: self.endpoint.clone(),
            registry: self.registry.clone(),
            query,
            page_size,
        };
        Ok(match self.strategy {
            PageStrategy::Sequential => pager.sequential(),
            PageStrategy::Background { capacity } => pager.background(capacity.max(1)),
        })
    }
}

/// Everything needed to fetch any page of one query.
struct Pager {
    requester: Arc<dyn Requester>,
    endpoint: Url,
    registry: MetadataRegistry,
    query: Query,
    page_size: u64,
}

impl Pager {
    async fn page(&self, skip: u64) -> Result<Decoder<Cursor<Vec<u8>>>, Error> {
        let mut query = self.query.clone();
        query.set_skip(skip)?;
        query.set_max(self.page_size)?;
        let url = request_url(&self.endpoint, &query)?;
        let body = self.requester.get(&url).await?;
        Ok(Decoder::new(Cursor::new(body), self.registry.clone()))
    }

    fn sequential(self) -> RecordStream {
        Box::pin(try_stream! {
            let mut skip = 0;
            loop {
                let mut decoder = self.page(skip).await?;
                for record in decoder.by_ref() {
                    yield record?;
                }
                if decoder.registry().fetch_count() < self.page_size {
                    break;
                }
                skip += self.page_size;
            }
        })
    }

    fn background(self, capacity: usize) -> RecordStream {
        Box::pin(stream! {
            let (tx, mut rx) = mpsc::channel(capacity);
            tokio::spawn(self.run(tx));

            while let Some(message) = rx.recv().await {
                match message {
                    PageMessage::Record(record) => yield Ok(record),
                    PageMessage::Done => break,
                    PageMessage::Failed(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        })
    }

    async fn run(self, tx: mpsc::Sender<PageMessage>) {
        match self.produce(&tx).await {
            Ok(total) => {
                info!(
                    "Downloaded {} records from {}:{}",
                    total,
                    self.query.get_arg(Arg::Database).unwrap_or_default(),
                    self.query.get_arg(Arg::Layout).unwrap_or_default(),
                );
                let _ = tx.send(PageMessage::Done).await;
            }
            Err(Stop::Closed) => debug!("Record stream dropped, stopping page fetch"),
            Err(Stop::Failed(e)) => {
                warn!("Page fetch failed: {}", e);
                let _ = tx.send(PageMessage::Failed(e)).await;
            }
        }
    }

    async fn produce(&self, tx: &mpsc::Sender<PageMessage>) -> Result<u64, Stop> {
        let mut skip = 0;
        let mut total = 0;
        loop {
            let mut decoder = self.page(skip).await.map_err(Stop::Failed)?;
            let mut fetched = 0;
            for record in decoder.by_ref() {
                let record = record.map_err(Stop::Failed)?;
                tx.send(PageMessage::Record(record))
                    .await
                    .map_err(|_| Stop::Closed)?;
                fetched += 1;
            }
            total += fetched;
            if decoder.registry().fetch_count() < self.page_size {
                return Ok(total);
            }
            skip += self.page_size;
        }
    }
}

/// Appends an encoded query to the endpoint.
pub(crate) fn request_url(endpoint: &Url, query: &Query) -> Result<Url, Error> {
    let encoded = query.encode()?;
    let mut url = endpoint.clone();
    url.set_query(Some(&encoded.to_string()));
    Ok(url)
}

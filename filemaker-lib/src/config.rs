//! Client configuration

use std::time::Duration;

use chrono::FixedOffset;

use crate::api::PageStrategy;
use crate::cast::BackCaster;
use crate::cast::CastMap;
use crate::meta::MetadataRegistry;
use crate::transport::RetryConfig;

/// Options shared by every request of a [`FileMakerClient`](crate::FileMakerClient).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use chrono::FixedOffset;
/// use filemaker_lib::api::PageStrategy;
/// use filemaker_lib::cast::{CastMap, CastType, CasterKind};
/// use filemaker_lib::config::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_server_timezone(FixedOffset::east_opt(3600).unwrap())
///     .with_cast_map(CastMap::default().with(CastType::Number, CasterKind::CommaDecimal))
///     .with_page_strategy(PageStrategy::Sequential)
///     .with_timeout(Duration::from_secs(60));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Timezone of the server clock.
    ///
    /// Decoded timestamps are localized to it and outgoing zoned timestamps
    /// are converted to it. Default: none (timestamps stay naive)
    pub server_timezone: Option<FixedOffset>,

    /// Casters per result type.
    ///
    /// Default: [`CastMap::default`]
    pub cast_map: CastMap,

    /// How paginated queries fetch their pages.
    ///
    /// Default: background fetching
    pub page_strategy: PageStrategy,

    /// Per-request timeout of the default requester.
    ///
    /// Default: 25 seconds
    pub timeout: Option<Duration>,

    /// Retry policy of the default requester.
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_timezone: None,
            cast_map: CastMap::default(),
            page_strategy: PageStrategy::default(),
            timeout: Some(Duration::from_secs(25)),
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server timezone.
    pub fn with_server_timezone(mut self, timezone: FixedOffset) -> Self {
        self.server_timezone = Some(timezone);
        self
    }

    /// Sets the cast map.
    pub fn with_cast_map(mut self, cast_map: CastMap) -> Self {
        self.cast_map = cast_map;
        self
    }

    /// Sets the pagination strategy.
    pub fn with_page_strategy(mut self, strategy: PageStrategy) -> Self {
        self.page_strategy = strategy;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// An empty registry for one response.
    pub(crate) fn registry(&self) -> MetadataRegistry {
        MetadataRegistry::with_cast_map(self.cast_map, self.server_timezone)
    }

    /// The back-caster for outgoing values.
    pub(crate) fn back_caster(&self) -> BackCaster {
        BackCaster::new(self.server_timezone)
    }
}

//! Request transport.
//!
//! The client only needs one capability from the network: fetch a URL and
//! return its body, failing on non-2xx statuses. [`Requester`] is that seam;
//! [`HttpRequester`] is the default implementation. Tests (and callers with
//! their own HTTP stack) plug in anything else.

mod http;
mod retry;

pub use http::*;
pub use retry::*;

use async_trait::async_trait;
use url::Url;

use crate::error::RequestError;

/// Fetches response bodies.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use filemaker_lib::error::RequestError;
/// use filemaker_lib::transport::Requester;
/// use url::Url;
///
/// struct Canned(Vec<u8>);
///
/// #[async_trait]
/// impl Requester for Canned {
///     async fn get(&self, _url: &Url) -> Result<Vec<u8>, RequestError> {
///         Ok(self.0.clone())
///     }
/// }
/// ```
#[async_trait]
pub trait Requester: Send + Sync {
    /// Performs a GET request and returns the body of a 2xx response.
    ///
    /// The body is returned whole, so one response is held in memory at a time.
    async fn get(&self, url: &Url) -> Result<Vec<u8>, RequestError>;
}

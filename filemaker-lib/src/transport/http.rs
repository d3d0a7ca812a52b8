//! Default reqwest-backed requester

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use log::warn;
use reqwest::Client;
use url::Url;

use super::Requester;
use super::RetryConfig;
use crate::error::RequestError;

/// HTTP basic auth credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Reads (and removes) the userinfo of a URL.
    ///
    /// Returns `None` when the URL carries no username.
    pub fn take_from_url(url: &mut Url) -> Option<Self> {
        if url.username().is_empty() {
            return None;
        }
        let username = decode_userinfo(url.username());
        let password = url.password().map(decode_userinfo).unwrap_or_default();
        // Only fails for cannot-be-a-base URLs, which have no userinfo.
        let _ = url.set_username("");
        let _ = url.set_password(None);
        Some(Self { username, password })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

fn decode_userinfo(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// A [`Requester`] over `reqwest`, with basic auth, timeout and retries.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use filemaker_lib::transport::{Credentials, HttpRequester, RetryConfig};
///
/// let requester = HttpRequester::new()
///     .unwrap()
///     .credentials(Credentials::new("admin", "secret"))
///     .timeout(Duration::from_secs(25))
///     .retry(RetryConfig::no_retry());
/// ```
#[derive(Debug, Clone)]
pub struct HttpRequester {
    client: Client,
    credentials: Option<Credentials>,
    timeout: Option<Duration>,
    retry: RetryConfig,
}

impl HttpRequester {
    /// Creates a requester with a default HTTP client.
    pub fn new() -> Result<Self, RequestError> {
        Ok(Self::with_client(Client::builder().build()?))
    }

    /// Creates a requester around an existing HTTP client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            credentials: None,
            timeout: None,
            retry: RetryConfig::default(),
        }
    }

    /// Sets basic auth credentials.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the retry policy.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// One attempt, without retry.
    async fn get_once(&self, url: &Url) -> Result<Vec<u8>, RequestError> {
        let mut request = self.client.get(url.clone());
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RequestError::http(status.as_u16(), body));
        }
        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        Ok(body.to_vec())
    }

    fn classify(&self, error: reqwest::Error) -> RequestError {
        match self.timeout {
            Some(timeout) if error.is_timeout() => RequestError::Timeout(timeout),
            _ => RequestError::Network(error),
        }
    }
}

#[async_trait]
impl Requester for HttpRequester {
    async fn get(&self, url: &Url) -> Result<Vec<u8>, RequestError> {
        let mut attempts = 0;
        let mut delay = self.retry.initial_delay;

        loop {
            debug!("GET {}", url);
            match self.get_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if self.retry.should_retry(&e, attempts) => {
                    warn!("Request failed ({}), retrying in {:?}", e, delay);
                    tokio::time::sleep(delay).await;
                    delay = self.retry.next_delay(delay);
                    attempts += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

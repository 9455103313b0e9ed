//! REST client for the Adafruit IO v2 HTTP API.
//!
//! One method per endpoint, one request per call. The client never retries
//! and never waits out a rate limit; every failure is handed back to the
//! caller as a [`ClientError`].

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::config::Settings;
use crate::models::{Data, DataValue, Feed, NewFeed, RandomValue, Weather};

/// Header carrying the Adafruit IO key.
const AIO_KEY_HEADER: &str = "X-AIO-Key";

/// Errors that can occur during REST client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service rejected the request
    #[error("Request failed ({status}): {message}")]
    Request { status: StatusCode, message: String },

    /// The account exceeded its Adafruit IO rate limit
    #[error("Throttled by Adafruit IO: {message}")]
    Throttled { message: String },

    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    /// Request timeout (only with a configured timeout)
    #[error("Request timed out")]
    Timeout,

    /// Failed to parse response body
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Client configuration error
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Http(err)
        }
    }
}

impl ClientError {
    /// True if the service answered 404 for the requested resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Request { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Adafruit IO REST client bound to a single account.
///
/// Building the client does no I/O. The underlying reqwest client keeps a
/// connection pool that is reused across calls.
pub struct AioClient {
    /// The underlying HTTP client (reused for connection pooling)
    client: Client,

    /// Account root, e.g. `https://io.adafruit.com/api/v2/alice`
    account_url: String,

    username: String,

    key: String,

    timeout: Option<Duration>,
}

impl std::fmt::Debug for AioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AioClient")
            .field("account_url", &self.account_url)
            .field("username", &self.username)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AioClient {
    /// Create a client for `username` using endpoint and timeout from `settings`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the HTTP client cannot be built.
    pub fn new(
        username: impl Into<String>,
        key: impl Into<String>,
        settings: &Settings,
    ) -> Result<Self, ClientError> {
        Self::with_settings(username, key, &settings.base_url, settings.request_timeout)
    }

    /// Create a client with explicit base URL and timeout.
    ///
    /// With `timeout` set to `None` requests wait as long as the service does.
    pub fn with_settings(
        username: impl Into<String>,
        key: impl Into<String>,
        base_url: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, ClientError> {
        let mut builder = Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        let username = username.into();
        let account_url = format!("{}/api/v2/{}", base_url.trim_end_matches('/'), username);

        Ok(Self {
            client,
            account_url,
            username,
            key: key.into(),
            timeout,
        })
    }

    /// List all feeds in the account, in the order the service reports them.
    pub async fn feeds(&self) -> Result<Vec<Feed>, ClientError> {
        self.get("feeds").await
    }

    /// Get metadata for a single feed.
    pub async fn feed(&self, feed_key: &str) -> Result<Feed, ClientError> {
        self.get(&format!("feeds/{}", feed_key)).await
    }

    /// Create a feed.
    pub async fn create_feed(&self, feed: &NewFeed) -> Result<Feed, ClientError> {
        self.post("feeds", &json!({ "feed": feed })).await
    }

    /// Delete a feed and all of its data.
    pub async fn delete_feed(&self, feed_key: &str) -> Result<(), ClientError> {
        let request = self.request(Method::DELETE, &format!("feeds/{}", feed_key));
        self.execute(request).await?;
        Ok(())
    }

    /// Append a value to a feed.
    pub async fn send_data(&self, feed_key: &str, value: &DataValue) -> Result<Data, ClientError> {
        self.post(&format!("feeds/{}/data", feed_key), &json!({ "value": value }))
            .await
    }

    /// Last value recorded in a feed.
    pub async fn receive(&self, feed_key: &str) -> Result<Data, ClientError> {
        self.get(&format!("feeds/{}/data/last", feed_key)).await
    }

    /// Weather snapshot for a weather integration location.
    pub async fn receive_weather(&self, location_id: &str) -> Result<Weather, ClientError> {
        self.get(&format!("integrations/weather/{}", location_id))
            .await
    }

    /// Current value of a random generator.
    pub async fn receive_random(&self, source_id: &str) -> Result<RandomValue, ClientError> {
        self.get(&format!("integrations/words/{}", source_id)).await
    }

    /// Account this client is bound to.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Account root URL.
    pub fn account_url(&self) -> &str {
        &self.account_url
    }

    /// Get the request timeout duration, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.account_url, path);
        debug!(method = %method, url = %url, "Adafruit IO request");

        self.client
            .request(method, url)
            .header(AIO_KEY_HEADER, self.key.as_str())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let body = self.execute(self.request(Method::GET, path)).await?;
        parse(&body)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path).json(body);
        let body = self.execute(request).await?;
        parse(&body)
    }

    /// Send a single request and return the body of a successful response.
    async fn execute(&self, request: RequestBuilder) -> Result<String, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.text().await?);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if status == StatusCode::TOO_MANY_REQUESTS {
            Err(ClientError::Throttled { message })
        } else {
            Err(ClientError::Request { status, message })
        }
    }
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    serde_json::from_str(body).map_err(|e| ClientError::Parse(e.to_string()))
}

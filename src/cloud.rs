//! Cloud facade over Adafruit IO.
//!
//! [`Cloud`] resolves settings once, builds the REST and MQTT handles if the
//! account credentials are present, and exposes feed management and data
//! upload/download. Every data-plane call checks the active flag first and
//! fails with [`CloudError::NotInitialized`] without touching the network if
//! the facade is inactive. Backend failures are logged and returned unchanged.
//!
//! # Example
//!
//! ```no_run
//! use f451_cloud::{Cloud, Settings};
//! use f451_cloud::config::{KWD_AIO_ID, KWD_AIO_KEY};
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = Settings::builder()
//!         .set(KWD_AIO_ID, "alice")
//!         .set(KWD_AIO_KEY, "aio_xxx")
//!         .build()
//!         .expect("valid settings");
//!
//!     let cloud = Cloud::new(&settings);
//!     let feed = cloud.create_feed("Temperature", true).await.unwrap();
//!     cloud.send_data(&feed.key, 21.5).await.unwrap();
//! }
//! ```

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::client::{AioClient, ClientError};
use crate::config::{Settings, KWD_AIO_LOC_ID, KWD_AIO_RNUM_ID, KWD_AIO_RWRD_ID};
use crate::models::{Data, DataValue, Feed, NewFeed, RandomValue, Weather};
use crate::stream::AioStream;

/// Cloud services the facade knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Adafruit IO REST + MQTT
    AdafruitIo,

    /// Arduino Cloud. Credentials are accepted but no client exists yet, so
    /// this backend is never active.
    ArduinoCloud,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::AdafruitIo => write!(f, "Adafruit IO"),
            Backend::ArduinoCloud => write!(f, "Arduino Cloud"),
        }
    }
}

/// Errors returned by the facade.
#[derive(Debug, Error)]
pub enum CloudError {
    /// The backend client was never built (missing credentials)
    #[error("{0} client not initiated")]
    NotInitialized(Backend),

    /// Strict feed creation found an existing feed with the same name
    #[error("Adafruit IO already has a feed named '{0}'")]
    DuplicateName(String),

    /// A call relied on a default ID that was not configured
    #[error("No value configured for {0}")]
    MissingSetting(&'static str),

    /// Backend failure, passed through unchanged
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl CloudError {
    /// True if the backend rejected the call because of its rate limit.
    pub fn is_throttled(&self) -> bool {
        matches!(self, CloudError::Client(ClientError::Throttled { .. }))
    }

    /// True if the backend reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::Client(e) if e.is_not_found())
    }
}

/// Facade over the Adafruit IO REST and MQTT clients.
#[derive(Debug)]
pub struct Cloud {
    rest: Option<AioClient>,
    stream: Option<AioStream>,
    aio_active: bool,
    location_id: Option<String>,
    rand_word_id: Option<String>,
    rand_number_id: Option<String>,
}

impl Cloud {
    /// Build the facade from resolved settings.
    ///
    /// No network I/O happens here. The facade is active iff both Adafruit IO
    /// credentials are non-empty and both handles were built.
    pub fn new(settings: &Settings) -> Self {
        let (aio_active, rest, stream) = Self::init_aio(settings);

        if settings.has_ard_credentials() {
            debug!("Arduino Cloud credentials provided but the backend is not supported");
        }

        Self {
            rest,
            stream,
            aio_active,
            location_id: settings.aio_loc_id.clone(),
            rand_word_id: settings.aio_rwrd_id.clone(),
            rand_number_id: settings.aio_rnum_id.clone(),
        }
    }

    fn init_aio(settings: &Settings) -> (bool, Option<AioClient>, Option<AioStream>) {
        let (Some(id), Some(key)) = (settings.aio_id.as_deref(), settings.aio_key.as_deref())
        else {
            return (false, None, None);
        };
        if id.is_empty() || key.is_empty() {
            return (false, None, None);
        }

        let rest = match AioClient::new(id, key, settings) {
            Ok(rest) => Some(rest),
            Err(e) => {
                error!(error = %e, "Failed to create Adafruit IO REST client");
                None
            }
        };
        let stream = Some(AioStream::new(id, key, settings));

        let active = rest.is_some() && stream.is_some();
        if active {
            info!(username = %id, "Adafruit IO clients initialized");
        }

        (active, rest, stream)
    }

    /// Whether the Adafruit IO clients are ready.
    pub fn is_active(&self) -> bool {
        self.aio_active
    }

    /// Whether the given backend is ready. Arduino Cloud is always inactive.
    pub fn is_backend_active(&self, backend: Backend) -> bool {
        match backend {
            Backend::AdafruitIo => self.aio_active,
            Backend::ArduinoCloud => false,
        }
    }

    /// Default weather location ID.
    pub fn location_id(&self) -> Option<&str> {
        self.location_id.as_deref()
    }

    /// Default random word generator ID.
    pub fn rand_word_id(&self) -> Option<&str> {
        self.rand_word_id.as_deref()
    }

    /// Default random number generator ID.
    pub fn rand_number_id(&self) -> Option<&str> {
        self.rand_number_id.as_deref()
    }

    /// The MQTT handle, if the facade is active.
    pub fn stream(&self) -> Option<&AioStream> {
        self.stream.as_ref().filter(|_| self.aio_active)
    }

    fn rest(&self) -> Result<&AioClient, CloudError> {
        match &self.rest {
            Some(rest) if self.aio_active => Ok(rest),
            _ => Err(CloudError::NotInitialized(Backend::AdafruitIo)),
        }
    }

    /// Create a feed named `name`.
    ///
    /// With `strict`, the current feed list is checked first and the call fails
    /// with [`CloudError::DuplicateName`] on an exact name match. The check and
    /// the create are two separate requests; a feed created by someone else in
    /// between is not detected.
    pub async fn create_feed(&self, name: &str, strict: bool) -> Result<Feed, CloudError> {
        let rest = self.rest()?;

        if strict {
            let feeds = rest.feeds().await.map_err(|e| log_failure("list feeds", name, e))?;
            if feeds.iter().any(|feed| feed.name == name) {
                warn!(feed_name = %name, "Feed already exists");
                return Err(CloudError::DuplicateName(name.to_string()));
            }
        }

        let feed = rest
            .create_feed(&NewFeed::new(name))
            .await
            .map_err(|e| log_failure("create feed", name, e))?;

        info!(feed_name = %name, feed_key = %feed.key, "Feed created");
        Ok(feed)
    }

    /// All feeds in the account, in backend order.
    pub async fn list_feeds(&self) -> Result<Vec<Feed>, CloudError> {
        Ok(self.rest()?.feeds().await?)
    }

    /// Metadata for an existing feed.
    pub async fn feed_info(&self, feed_key: &str) -> Result<Feed, CloudError> {
        Ok(self.rest()?.feed(feed_key).await?)
    }

    /// Delete a feed.
    pub async fn delete_feed(&self, feed_key: &str) -> Result<(), CloudError> {
        self.rest()?
            .delete_feed(feed_key)
            .await
            .map_err(|e| log_failure("delete feed", feed_key, e))?;

        info!(feed_key = %feed_key, "Feed deleted");
        Ok(())
    }

    /// Upload a value to a feed.
    pub async fn send_data(
        &self,
        feed_key: &str,
        value: impl Into<DataValue>,
    ) -> Result<(), CloudError> {
        let rest = self.rest()?;
        let value = value.into();

        rest.send_data(feed_key, &value)
            .await
            .map_err(|e| log_failure("upload", feed_key, e))?;

        debug!(feed_key = %feed_key, value = %value, "Data sent");
        Ok(())
    }

    /// Last value recorded in a feed.
    pub async fn receive_data(&self, feed_key: &str) -> Result<DataValue, CloudError> {
        Ok(self.receive_data_raw(feed_key).await?.value)
    }

    /// Last data record of a feed, with timestamps and IDs.
    pub async fn receive_data_raw(&self, feed_key: &str) -> Result<Data, CloudError> {
        let rest = self.rest()?;
        rest.receive(feed_key)
            .await
            .map_err(|e| log_failure("download", feed_key, e))
    }

    /// Weather snapshot as a plain key-ordered JSON object.
    ///
    /// Uses the configured location when `location_id` is `None`.
    pub async fn receive_weather(
        &self,
        location_id: Option<&str>,
    ) -> Result<Map<String, Value>, CloudError> {
        let weather = self.receive_weather_raw(location_id).await?;
        normalize(&weather)
    }

    /// Weather snapshot as returned by the service.
    pub async fn receive_weather_raw(
        &self,
        location_id: Option<&str>,
    ) -> Result<Weather, CloudError> {
        let rest = self.rest()?;
        let location_id = location_id
            .or(self.location_id.as_deref())
            .ok_or(CloudError::MissingSetting(KWD_AIO_LOC_ID))?;

        rest.receive_weather(location_id)
            .await
            .map_err(|e| log_failure("weather lookup", location_id, e))
    }

    /// Current value of a random generator.
    pub async fn receive_random(&self, source_id: &str) -> Result<DataValue, CloudError> {
        Ok(self.receive_random_raw(source_id).await?.value)
    }

    /// Full random generator record.
    pub async fn receive_random_raw(&self, source_id: &str) -> Result<RandomValue, CloudError> {
        let rest = self.rest()?;
        rest.receive_random(source_id)
            .await
            .map_err(|e| log_failure("random lookup", source_id, e))
    }

    /// Value of the configured random word generator.
    pub async fn receive_random_word(&self) -> Result<DataValue, CloudError> {
        self.rest()?;
        let source_id = self
            .rand_word_id
            .as_deref()
            .ok_or(CloudError::MissingSetting(KWD_AIO_RWRD_ID))?;
        self.receive_random(source_id).await
    }

    /// Value of the configured random number generator.
    pub async fn receive_random_number(&self) -> Result<DataValue, CloudError> {
        self.rest()?;
        let source_id = self
            .rand_number_id
            .as_deref()
            .ok_or(CloudError::MissingSetting(KWD_AIO_RNUM_ID))?;
        self.receive_random(source_id).await
    }
}

/// Log a backend failure and hand it back unchanged.
fn log_failure(action: &str, subject: &str, err: ClientError) -> CloudError {
    match &err {
        ClientError::Throttled { .. } => {
            warn!(action, subject = %subject, error = %err, "Adafruit IO throttled request")
        }
        _ => error!(action, subject = %subject, error = %err, "Adafruit IO request failed"),
    }
    CloudError::Client(err)
}

/// Strip the typed record down to a plain JSON object.
fn normalize(weather: &Weather) -> Result<Map<String, Value>, CloudError> {
    match serde_json::to_value(weather) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ClientError::Parse(format!("expected a JSON object, got {}", other)).into()),
        Err(e) => Err(ClientError::Parse(e.to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        KWD_AIO_BASE_URL, KWD_AIO_ID, KWD_AIO_KEY, KWD_AIO_MQTT_PORT, KWD_ARD_ID, KWD_ARD_KEY,
    };
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn active_settings(base_url: &str) -> Settings {
        Settings::builder()
            .set(KWD_AIO_ID, "alice")
            .set(KWD_AIO_KEY, "secret")
            .set(KWD_AIO_BASE_URL, base_url)
            .set(KWD_AIO_MQTT_PORT, "1883")
            .build()
            .unwrap()
    }

    fn feed_body(key: &str, name: &str) -> String {
        json!({"id": 1, "key": key, "name": name}).to_string()
    }

    fn assert_not_initialized<T: std::fmt::Debug>(result: Result<T, CloudError>) {
        match result {
            Err(CloudError::NotInitialized(Backend::AdafruitIo)) => {}
            other => panic!("expected NotInitialized, got {:?}", other),
        }
    }

    #[test]
    fn test_inactive_without_credentials() {
        let inputs = [
            Settings::default(),
            Settings::builder().set(KWD_AIO_ID, "alice").build().unwrap(),
            Settings::builder().set(KWD_AIO_KEY, "secret").build().unwrap(),
            Settings::builder()
                .set(KWD_AIO_ID, "")
                .set(KWD_AIO_KEY, "secret")
                .build()
                .unwrap(),
            Settings::builder()
                .set(KWD_AIO_ID, "alice")
                .set(KWD_AIO_KEY, "")
                .build()
                .unwrap(),
        ];

        for settings in &inputs {
            let cloud = Cloud::new(settings);
            assert!(!cloud.is_active());
            assert!(cloud.stream().is_none());
        }
    }

    #[test]
    fn test_active_with_credentials_and_no_network() {
        // Nothing listens on this port; construction must not care.
        let cloud = Cloud::new(&active_settings("http://127.0.0.1:9"));
        assert!(cloud.is_active());
        assert!(cloud.is_backend_active(Backend::AdafruitIo));
        assert!(cloud.stream().is_some());
    }

    #[test]
    fn test_bulk_and_override_merge() {
        let mut bulk = BTreeMap::new();
        bulk.insert(KWD_AIO_ID.to_string(), "alice".to_string());
        bulk.insert(KWD_AIO_KEY.to_string(), "secret".to_string());
        bulk.insert(KWD_AIO_LOC_ID.to_string(), "100".to_string());
        bulk.insert(KWD_AIO_MQTT_PORT.to_string(), "1883".to_string());

        let settings = Settings::builder()
            .with_map(bulk)
            .set(KWD_AIO_LOC_ID, "200")
            .build()
            .unwrap();
        let cloud = Cloud::new(&settings);

        assert!(cloud.is_active());
        assert_eq!(cloud.location_id(), Some("200"));
    }

    #[test]
    fn test_arduino_never_active() {
        let settings = Settings::builder()
            .set(KWD_ARD_ID, "client")
            .set(KWD_ARD_KEY, "secret")
            .build()
            .unwrap();
        let cloud = Cloud::new(&settings);

        assert!(!cloud.is_backend_active(Backend::ArduinoCloud));
        assert!(!cloud.is_active());

        let cloud = Cloud::new(&active_settings("http://127.0.0.1:9"));
        assert!(!cloud.is_backend_active(Backend::ArduinoCloud));
    }

    #[test]
    fn test_stored_ids_verbatim() {
        let settings = Settings::builder()
            .set(KWD_AIO_RWRD_ID, " words ")
            .set(KWD_AIO_RNUM_ID, "42")
            .build()
            .unwrap();
        let cloud = Cloud::new(&settings);

        assert_eq!(cloud.rand_word_id(), Some(" words "));
        assert_eq!(cloud.rand_number_id(), Some("42"));
        assert_eq!(cloud.location_id(), None);
    }

    #[tokio::test]
    async fn test_inactive_operations_never_reach_backend() {
        let mut server = Server::new_async().await;
        let mut mocks = Vec::new();
        for method in ["GET", "POST", "DELETE"] {
            mocks.push(
                server
                    .mock(method, Matcher::Any)
                    .expect(0)
                    .create_async()
                    .await,
            );
        }

        let settings = Settings::builder()
            .set(KWD_AIO_ID, "alice")
            .set(KWD_AIO_BASE_URL, server.url())
            .set(KWD_AIO_LOC_ID, "1")
            .set(KWD_AIO_RWRD_ID, "2")
            .set(KWD_AIO_RNUM_ID, "3")
            .build()
            .unwrap();
        let cloud = Cloud::new(&settings);

        assert_not_initialized(cloud.create_feed("T", false).await);
        assert_not_initialized(cloud.create_feed("T", true).await);
        assert_not_initialized(cloud.list_feeds().await);
        assert_not_initialized(cloud.feed_info("t").await);
        assert_not_initialized(cloud.delete_feed("t").await);
        assert_not_initialized(cloud.send_data("t", 1).await);
        assert_not_initialized(cloud.receive_data("t").await);
        assert_not_initialized(cloud.receive_data_raw("t").await);
        assert_not_initialized(cloud.receive_weather(None).await);
        assert_not_initialized(cloud.receive_weather_raw(Some("1")).await);
        assert_not_initialized(cloud.receive_random("2").await);
        assert_not_initialized(cloud.receive_random_raw("2").await);
        assert_not_initialized(cloud.receive_random_word().await);
        assert_not_initialized(cloud.receive_random_number().await);

        for mock in mocks {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_strict_create_rejects_duplicate() {
        let mut server = Server::new_async().await;

        let list = server
            .mock("GET", "/api/v2/alice/feeds")
            .with_status(200)
            .with_body(format!("[{}]", feed_body("t-1", "T-1")))
            .create_async()
            .await;
        let create = server
            .mock("POST", "/api/v2/alice/feeds")
            .expect(0)
            .create_async()
            .await;

        let cloud = Cloud::new(&active_settings(&server.url()));
        let err = cloud.create_feed("T-1", true).await.unwrap_err();

        assert!(matches!(err, CloudError::DuplicateName(ref name) if name == "T-1"));
        list.assert_async().await;
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_strict_create_is_case_sensitive() {
        let mut server = Server::new_async().await;

        let list = server
            .mock("GET", "/api/v2/alice/feeds")
            .with_status(200)
            .with_body(format!("[{}]", feed_body("t-1", "t-1")))
            .create_async()
            .await;
        let create = server
            .mock("POST", "/api/v2/alice/feeds")
            .match_body(Matcher::PartialJson(json!({"feed": {"name": "T-1"}})))
            .with_status(201)
            .with_body(feed_body("t-1-2", "T-1"))
            .create_async()
            .await;

        let cloud = Cloud::new(&active_settings(&server.url()));
        let feed = cloud.create_feed("T-1", true).await.unwrap();

        assert_eq!(feed.name, "T-1");
        list.assert_async().await;
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_strict_create_skips_listing() {
        let mut server = Server::new_async().await;

        let list = server
            .mock("GET", "/api/v2/alice/feeds")
            .expect(0)
            .create_async()
            .await;
        let create = server
            .mock("POST", "/api/v2/alice/feeds")
            .with_status(201)
            .with_body(feed_body("t-1", "T-1"))
            .create_async()
            .await;

        let cloud = Cloud::new(&active_settings(&server.url()));
        let feed = cloud.create_feed("T-1", false).await.unwrap();

        assert_eq!(feed.key, "t-1");
        list.assert_async().await;
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_receive_data_is_raw_value() {
        let mut server = Server::new_async().await;

        server
            .mock("GET", "/api/v2/alice/feeds/t-1/data/last")
            .with_status(200)
            .with_body(
                json!({
                    "id": "0F8Q",
                    "value": "21.5",
                    "feed_id": 1,
                    "feed_key": "t-1",
                    "created_at": "2024-05-01T12:00:00Z"
                })
                .to_string(),
            )
            .expect(2)
            .create_async()
            .await;

        let cloud = Cloud::new(&active_settings(&server.url()));
        let raw = cloud.receive_data_raw("t-1").await.unwrap();
        let value = cloud.receive_data("t-1").await.unwrap();

        assert_eq!(value, raw.value);
        assert_eq!(value.as_f64(), Some(21.5));
    }

    #[tokio::test]
    async fn test_feed_round_trip() {
        let mut server = Server::new_async().await;
        let name = format!("T-{}", uuid::Uuid::new_v4().simple());
        let key = name.to_lowercase();

        server
            .mock("POST", "/api/v2/alice/feeds")
            .with_status(201)
            .with_body(feed_body(&key, &name))
            .create_async()
            .await;
        server
            .mock("POST", format!("/api/v2/alice/feeds/{}/data", key).as_str())
            .match_body(Matcher::Json(json!({"value": 42})))
            .with_status(200)
            .with_body(json!({"id": "a", "value": "42"}).to_string())
            .create_async()
            .await;
        server
            .mock("GET", format!("/api/v2/alice/feeds/{}/data/last", key).as_str())
            .with_status(200)
            .with_body(json!({"id": "a", "value": "42"}).to_string())
            .create_async()
            .await;
        server
            .mock("DELETE", format!("/api/v2/alice/feeds/{}", key).as_str())
            .with_status(200)
            .create_async()
            .await;
        server
            .mock("GET", format!("/api/v2/alice/feeds/{}", key).as_str())
            .with_status(404)
            .with_body(r#"{"error": "not found"}"#)
            .create_async()
            .await;

        let cloud = Cloud::new(&active_settings(&server.url()));

        let feed = cloud.create_feed(&name, false).await.unwrap();
        cloud.send_data(&feed.key, 42).await.unwrap();
        let value = cloud.receive_data(&feed.key).await.unwrap();
        assert_eq!(value.as_f64(), Some(42.0));

        cloud.delete_feed(&feed.key).await.unwrap();
        let err = cloud.feed_info(&feed.key).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_throttling_passes_through() {
        let mut server = Server::new_async().await;

        server
            .mock("POST", "/api/v2/alice/feeds/t-1/data")
            .with_status(429)
            .with_body("too many requests")
            .create_async()
            .await;

        let cloud = Cloud::new(&active_settings(&server.url()));
        let err = cloud.send_data("t-1", "hello").await.unwrap_err();

        assert!(err.is_throttled());
        assert_eq!(err.to_string(), "Throttled by Adafruit IO: too many requests");
    }

    #[tokio::test]
    async fn test_request_failure_passes_through() {
        let mut server = Server::new_async().await;

        server
            .mock("GET", "/api/v2/alice/feeds")
            .with_status(401)
            .with_body("bad key")
            .create_async()
            .await;

        let cloud = Cloud::new(&active_settings(&server.url()));
        let err = cloud.list_feeds().await.unwrap_err();

        match err {
            CloudError::Client(ClientError::Request { status, message }) => {
                assert_eq!(status.as_u16(), 401);
                assert_eq!(message, "bad key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_weather_defaults_to_stored_location() {
        let mut server = Server::new_async().await;

        let body = json!({
            "forecast_hours_1": {"temperature": 11.0},
            "current": {"temperature": 12.5, "summary": "Clear"}
        });
        let mock = server
            .mock("GET", "/api/v2/alice/integrations/weather/2127")
            .with_status(200)
            .with_body(body.to_string())
            .expect(2)
            .create_async()
            .await;

        let settings = Settings::builder()
            .with_map(vec![(KWD_AIO_LOC_ID, "2127")])
            .overrides(vec![
                (KWD_AIO_ID, "alice"),
                (KWD_AIO_KEY, "secret"),
                (KWD_AIO_MQTT_PORT, "1883"),
            ])
            .set(KWD_AIO_BASE_URL, server.url())
            .build()
            .unwrap();
        let cloud = Cloud::new(&settings);

        let normalized = cloud.receive_weather(None).await.unwrap();
        let raw = cloud.receive_weather_raw(None).await.unwrap();

        let keys: Vec<&str> = normalized.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["current", "forecast_hours_1"]);
        assert_eq!(Value::Object(normalized), serde_json::to_value(&raw).unwrap());
        assert_eq!(raw.current, Some(json!({"temperature": 12.5, "summary": "Clear"})));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_inactive_weather_without_location_is_not_initialized() {
        let cloud = Cloud::new(&Settings::default());
        assert_not_initialized(cloud.receive_weather(None).await);
        assert_not_initialized(cloud.receive_weather_raw(None).await);
        assert_not_initialized(cloud.receive_random_word().await);
        assert_not_initialized(cloud.receive_random_number().await);
    }

    #[tokio::test]
    async fn test_weather_keeps_unknown_keys() {
        let mut server = Server::new_async().await;

        let body = json!({"current": {"t": 1}, "id": 9, "location": {"name": "NYC"}});
        server
            .mock("GET", "/api/v2/alice/integrations/weather/1")
            .with_status(200)
            .with_body(body.to_string())
            .expect(2)
            .create_async()
            .await;

        let cloud = Cloud::new(&active_settings(&server.url()));
        let raw = cloud.receive_weather_raw(Some("1")).await.unwrap();
        let normalized = cloud.receive_weather(Some("1")).await.unwrap();

        assert_eq!(raw.extra.get("location"), Some(&json!({"name": "NYC"})));
        assert_eq!(Value::Object(normalized), body);
    }

    #[tokio::test]
    async fn test_receive_data_with_string_coordinates() {
        let mut server = Server::new_async().await;

        server
            .mock("GET", "/api/v2/alice/feeds/t/data/last")
            .with_status(200)
            .with_body(r#"{"id": "a", "value": "5", "lat": "40.7", "lon": "-74.0", "ele": null}"#)
            .create_async()
            .await;

        let cloud = Cloud::new(&active_settings(&server.url()));
        let value = cloud.receive_data("t").await.unwrap();

        assert_eq!(value, DataValue::Text("5".to_string()));
    }

    #[test]
    fn test_normalize_weather_object() {
        let weather = Weather {
            current: Some(json!({"t": 1})),
            ..Default::default()
        };
        let map = normalize(&weather).unwrap();
        assert_eq!(map.get("current"), Some(&json!({"t": 1})));
    }

    #[tokio::test]
    async fn test_weather_without_location() {
        let cloud = Cloud::new(&active_settings("http://127.0.0.1:9"));
        let err = cloud.receive_weather(None).await.unwrap_err();
        assert!(matches!(err, CloudError::MissingSetting(KWD_AIO_LOC_ID)));
    }

    #[tokio::test]
    async fn test_random_word_uses_stored_id() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/api/v2/alice/integrations/words/77")
            .with_status(200)
            .with_body(json!({"id": 77, "name": "words", "kind": "words", "value": "otter"}).to_string())
            .create_async()
            .await;

        let settings = Settings::builder()
            .with_map(vec![
                (KWD_AIO_ID, "alice"),
                (KWD_AIO_KEY, "secret"),
                (KWD_AIO_RWRD_ID, "77"),
                (KWD_AIO_MQTT_PORT, "1883"),
            ])
            .set(KWD_AIO_BASE_URL, server.url())
            .build()
            .unwrap();
        let cloud = Cloud::new(&settings);

        let word = cloud.receive_random_word().await.unwrap();
        assert_eq!(word.as_str(), Some("otter"));

        let err = cloud.receive_random_number().await.unwrap_err();
        assert!(matches!(err, CloudError::MissingSetting(KWD_AIO_RNUM_ID)));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_receive_random_value_matches_raw() {
        let mut server = Server::new_async().await;

        server
            .mock("GET", "/api/v2/alice/integrations/words/5")
            .with_status(200)
            .with_body(json!({"id": 5, "kind": "numbers", "value": 17, "seed": null}).to_string())
            .expect(2)
            .create_async()
            .await;

        let cloud = Cloud::new(&active_settings(&server.url()));
        let raw = cloud.receive_random_raw("5").await.unwrap();
        let value = cloud.receive_random("5").await.unwrap();

        assert_eq!(value, raw.value);
        assert_eq!(value, DataValue::Int(17));
    }

    #[test]
    fn test_cloud_error_display() {
        let err = CloudError::NotInitialized(Backend::AdafruitIo);
        assert_eq!(err.to_string(), "Adafruit IO client not initiated");

        let err = CloudError::DuplicateName("T-1".to_string());
        assert_eq!(err.to_string(), "Adafruit IO already has a feed named 'T-1'");

        let err = CloudError::MissingSetting(KWD_AIO_LOC_ID);
        assert_eq!(err.to_string(), "No value configured for AIO_LOC_ID");
    }
}

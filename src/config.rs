//! Configuration module for the cloud facade.
//!
//! Settings are assembled from two sources: an optional bulk mapping (usually
//! the contents of a `settings.toml` file) and explicit overrides. An override
//! always wins over the bulk value for the same key, no matter in which order
//! the two were handed to the builder.

use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Adafruit IO username.
pub const KWD_AIO_ID: &str = "AIO_ID";
/// Adafruit IO key.
pub const KWD_AIO_KEY: &str = "AIO_KEY";
/// Default weather location ID.
pub const KWD_AIO_LOC_ID: &str = "AIO_LOC_ID";
/// Default random word generator ID.
pub const KWD_AIO_RWRD_ID: &str = "AIO_RWRD_ID";
/// Default random number generator ID.
pub const KWD_AIO_RNUM_ID: &str = "AIO_RNUM_ID";
/// Arduino Cloud client ID.
pub const KWD_ARD_ID: &str = "ARD_ID";
/// Arduino Cloud client secret.
pub const KWD_ARD_KEY: &str = "ARD_KEY";
/// Base URL of the Adafruit IO REST API.
pub const KWD_AIO_BASE_URL: &str = "AIO_BASE_URL";
/// REST request timeout in seconds.
pub const KWD_AIO_TIMEOUT_SECS: &str = "AIO_TIMEOUT_SECS";
/// Adafruit IO MQTT broker host.
pub const KWD_AIO_MQTT_HOST: &str = "AIO_MQTT_HOST";
/// Adafruit IO MQTT broker port.
pub const KWD_AIO_MQTT_PORT: &str = "AIO_MQTT_PORT";

/// Every key the facade knows about.
pub const RECOGNIZED_KEYS: &[&str] = &[
    KWD_AIO_ID,
    KWD_AIO_KEY,
    KWD_AIO_LOC_ID,
    KWD_AIO_RWRD_ID,
    KWD_AIO_RNUM_ID,
    KWD_ARD_ID,
    KWD_ARD_KEY,
    KWD_AIO_BASE_URL,
    KWD_AIO_TIMEOUT_SECS,
    KWD_AIO_MQTT_HOST,
    KWD_AIO_MQTT_PORT,
];

/// Default Adafruit IO REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://io.adafruit.com";

/// Default Adafruit IO MQTT broker
pub const DEFAULT_MQTT_HOST: &str = "io.adafruit.com";

/// Default MQTT port (TLS)
pub const DEFAULT_MQTT_PORT: u16 = 8883;

/// Plain TCP MQTT port
pub const PLAIN_MQTT_PORT: u16 = 1883;

/// Upper bound for the request timeout
const MAX_TIMEOUT_SECS: u64 = 300;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Settings file could not be read
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not valid TOML
    #[error("Invalid settings file: {0}")]
    Toml(#[from] toml::de::Error),

    /// A setting has an unusable value
    #[error("Configuration error for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Resolved facade settings.
///
/// Credentials and feed IDs are kept verbatim (`None` when the key was absent
/// from both sources); no validation is done on them here.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Adafruit IO username
    pub aio_id: Option<String>,

    /// Adafruit IO key
    pub aio_key: Option<String>,

    /// Default weather location ID
    pub aio_loc_id: Option<String>,

    /// Default random word generator ID
    pub aio_rwrd_id: Option<String>,

    /// Default random number generator ID
    pub aio_rnum_id: Option<String>,

    /// Arduino Cloud client ID (accepted, never used)
    pub ard_id: Option<String>,

    /// Arduino Cloud client secret (accepted, never used)
    pub ard_key: Option<String>,

    /// REST base URL without trailing slash
    pub base_url: String,

    /// REST request timeout. Unset unless `AIO_TIMEOUT_SECS` is given.
    pub request_timeout: Option<Duration>,

    /// MQTT broker host
    pub mqtt_host: String,

    /// MQTT broker port
    pub mqtt_port: u16,

    values: BTreeMap<String, String>,
}

impl Settings {
    /// Start building settings.
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Load settings from a TOML file with no overrides.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::builder().with_map(load_toml_map(path)?).build()
    }

    /// Raw merged value for any key, including keys the facade ignores.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// True if both Adafruit IO credentials are present and non-empty.
    pub fn has_aio_credentials(&self) -> bool {
        non_empty(&self.aio_id) && non_empty(&self.aio_key)
    }

    /// True if both Arduino Cloud credentials are present and non-empty.
    pub fn has_ard_credentials(&self) -> bool {
        non_empty(&self.ard_id) && non_empty(&self.ard_key)
    }
}

impl Default for Settings {
    /// Settings with no credentials and default endpoints.
    fn default() -> Self {
        Self {
            aio_id: None,
            aio_key: None,
            aio_loc_id: None,
            aio_rwrd_id: None,
            aio_rnum_id: None,
            ard_id: None,
            ard_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
            mqtt_host: DEFAULT_MQTT_HOST.to_string(),
            mqtt_port: DEFAULT_MQTT_PORT,
            values: BTreeMap::new(),
        }
    }
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// Two-source settings builder.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use f451_cloud::config::{Settings, KWD_AIO_ID, KWD_AIO_KEY};
///
/// let mut bulk = BTreeMap::new();
/// bulk.insert(KWD_AIO_ID.to_string(), "alice".to_string());
/// bulk.insert(KWD_AIO_KEY.to_string(), "old-key".to_string());
///
/// let settings = Settings::builder()
///     .set(KWD_AIO_KEY, "new-key")
///     .with_map(bulk)
///     .build()
///     .unwrap();
///
/// assert_eq!(settings.aio_key.as_deref(), Some("new-key"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    base: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl SettingsBuilder {
    /// Use `map` as the bulk mapping, replacing any previous one.
    pub fn with_map<I, K, V>(mut self, map: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.base = map.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    /// Add a single override.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    /// Add several overrides at once.
    pub fn overrides<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.overrides
            .extend(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Merge both sources and resolve the typed settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the timeout or MQTT port is not a
    /// valid number or is out of range.
    pub fn build(self) -> Result<Settings, ConfigError> {
        let mut values = self.base;
        values.extend(self.overrides);

        let take = |key: &str| values.get(key).cloned();

        let base_url = take(KWD_AIO_BASE_URL)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let request_timeout = values
            .get(KWD_AIO_TIMEOUT_SECS)
            .map(|raw| parse_timeout(raw).map(Duration::from_secs))
            .transpose()?;

        let mqtt_port = match values.get(KWD_AIO_MQTT_PORT) {
            Some(raw) => parse_port(raw)?,
            None => DEFAULT_MQTT_PORT,
        };

        Ok(Settings {
            aio_id: take(KWD_AIO_ID),
            aio_key: take(KWD_AIO_KEY),
            aio_loc_id: take(KWD_AIO_LOC_ID),
            aio_rwrd_id: take(KWD_AIO_RWRD_ID),
            aio_rnum_id: take(KWD_AIO_RNUM_ID),
            ard_id: take(KWD_ARD_ID),
            ard_key: take(KWD_ARD_KEY),
            base_url,
            request_timeout,
            mqtt_host: take(KWD_AIO_MQTT_HOST).unwrap_or_else(|| DEFAULT_MQTT_HOST.to_string()),
            mqtt_port,
            values,
        })
    }
}

fn parse_timeout(raw: &str) -> Result<u64, ConfigError> {
    let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key: KWD_AIO_TIMEOUT_SECS.to_string(),
        message: format!("'{}' is not a valid number", raw),
    })?;

    if secs == 0 || secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::Invalid {
            key: KWD_AIO_TIMEOUT_SECS.to_string(),
            message: format!("timeout must be between 1 and {}s", MAX_TIMEOUT_SECS),
        });
    }

    Ok(secs)
}

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::Invalid {
            key: KWD_AIO_MQTT_PORT.to_string(),
            message: format!("'{}' is not a valid port", raw),
        }),
    }
}

/// Parse a flat TOML document into a settings mapping.
///
/// Scalars are kept in their textual form. Tables and arrays are skipped.
pub fn parse_toml_map(content: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let table: toml::Table = content.parse()?;
    let mut map = BTreeMap::new();

    for (key, value) in table {
        let text = match value {
            toml::Value::String(s) => s,
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Float(f) => f.to_string(),
            toml::Value::Boolean(b) => b.to_string(),
            toml::Value::Datetime(d) => d.to_string(),
            toml::Value::Array(_) | toml::Value::Table(_) => {
                debug!(key = %key, "Skipping non-scalar setting");
                continue;
            }
        };
        map.insert(key, text);
    }

    Ok(map)
}

/// Read a TOML settings file into a settings mapping.
pub fn load_toml_map(path: impl AsRef<Path>) -> Result<BTreeMap<String, String>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_toml_map(&content)
}

/// Collect every recognized key that is set in the process environment.
pub fn env_overrides() -> BTreeMap<String, String> {
    RECOGNIZED_KEYS
        .iter()
        .filter_map(|key| env::var(key).ok().map(|v| (key.to_string(), v)))
        .collect()
}

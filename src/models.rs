//! Adafruit IO records exchanged with the REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single data point value.
///
/// Adafruit IO stores every value as text, so values read back from the
/// service usually arrive as [`DataValue::Text`] even if they were sent as
/// numbers. Use [`DataValue::as_f64`] to compare numerically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl DataValue {
    /// Numeric view of the value, parsing text if needed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Int(i) => Some(*i as f64),
            DataValue::Float(f) => Some(*f),
            DataValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Text view of the value, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for DataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataValue::Int(i) => write!(f, "{}", i),
            DataValue::Float(v) => write!(f, "{}", v),
            DataValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Int(value)
    }
}

impl From<i32> for DataValue {
    fn from(value: i32) -> Self {
        DataValue::Int(value.into())
    }
}

impl From<u32> for DataValue {
    fn from(value: u32) -> Self {
        DataValue::Int(value.into())
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Float(value)
    }
}

impl From<f32> for DataValue {
    fn from(value: f32) -> Self {
        DataValue::Float(value.into())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::Text(value)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Text(value.to_string())
    }
}

/// Feed metadata as reported by Adafruit IO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    /// Feed key, generated by the service from the name
    pub key: String,

    /// Human readable feed name
    pub name: String,

    #[serde(default)]
    pub id: Option<u64>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub unit_type: Option<String>,

    #[serde(default)]
    pub unit_symbol: Option<String>,

    /// Whether the feed keeps history
    #[serde(default)]
    pub history: Option<bool>,

    /// `private` or `public`
    #[serde(default)]
    pub visibility: Option<String>,

    #[serde(default)]
    pub license: Option<String>,

    #[serde(default)]
    pub status_notify: Option<bool>,

    /// Minutes without data before the feed is flagged offline
    #[serde(default)]
    pub status_timeout: Option<u64>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request body for creating a feed.
#[derive(Debug, Clone, Serialize)]
pub struct NewFeed {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewFeed {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// A data point as stored by Adafruit IO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Data {
    /// The recorded value
    pub value: DataValue,

    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub feed_id: Option<u64>,

    #[serde(default)]
    pub feed_key: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Creation time as seconds since the epoch
    #[serde(default)]
    pub created_epoch: Option<f64>,

    #[serde(default)]
    pub expiration: Option<String>,

    /// Coordinates arrive as numbers or as decimal strings
    #[serde(default)]
    pub lat: Option<DataValue>,

    #[serde(default)]
    pub lon: Option<DataValue>,

    #[serde(default)]
    pub ele: Option<DataValue>,
}

/// Weather snapshot from the Adafruit IO weather integration.
///
/// The forecast blocks are kept as plain JSON; their layout is defined by the
/// upstream weather provider and changes independently of this crate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Weather {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_minutes_5: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_minutes_30: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_hours_1: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_hours_2: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_hours_6: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_hours_24: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_days_1: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_days_2: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_days_5: Option<Value>,

    /// Any other top-level keys the service sends
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Output of an Adafruit IO random generator (word or number).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomValue {
    pub value: DataValue,

    #[serde(default)]
    pub id: Option<u64>,

    #[serde(default)]
    pub name: Option<String>,

    /// Generator kind, e.g. `words`
    #[serde(default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub seed: Option<Value>,
}

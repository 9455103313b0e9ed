//! f451 Labs Cloud Library
//!
//! A small facade over Adafruit IO used across f451 Labs projects:
//!
//! - **config**: Settings merged from a bulk mapping (e.g. `settings.toml`) and overrides
//! - **cloud**: The `Cloud` facade with feed management and data upload/download
//! - **client**: Adafruit IO REST client
//! - **stream**: Adafruit IO MQTT handle
//! - **models**: Feed, data, weather and random generator records
//!
//! # Example
//!
//! ```no_run
//! use f451_cloud::config::{self, Settings};
//! use f451_cloud::Cloud;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Settings file first, environment variables on top
//!     let settings = Settings::builder()
//!         .with_map(config::load_toml_map("settings.toml").expect("Failed to load settings"))
//!         .overrides(config::env_overrides())
//!         .build()
//!         .expect("Invalid settings");
//!
//!     let cloud = Cloud::new(&settings);
//!     if cloud.is_active() {
//!         let value = cloud.receive_data("temperature").await.ok();
//!         println!("{:?}", value);
//!     }
//! }
//! ```

// Module declarations
pub mod client;
pub mod cloud;
pub mod config;
pub mod models;
pub mod stream;

// Re-export commonly used types at crate root for convenience
pub use client::{AioClient, ClientError};
pub use cloud::{Backend, Cloud, CloudError};
pub use config::{ConfigError, Settings, SettingsBuilder};
pub use models::{Data, DataValue, Feed, NewFeed, RandomValue, Weather};
pub use stream::AioStream;

//! MQTT handle for the Adafruit IO broker.
//!
//! The handle is only built here: no connection is opened until someone polls
//! the event loop, and the facade never does.

use std::sync::Mutex;
use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions, Transport};
use tracing::debug;
use uuid::Uuid;

use crate::config::{Settings, PLAIN_MQTT_PORT};

/// Capacity of the request queue between client and event loop.
const REQUEST_QUEUE_CAPACITY: usize = 10;

/// MQTT keep-alive interval.
const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Unpolled MQTT client bound to an Adafruit IO account.
pub struct AioStream {
    client: AsyncClient,
    client_id: String,
    event_loop: Mutex<Option<EventLoop>>,
}

impl std::fmt::Debug for AioStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AioStream")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl AioStream {
    /// Build a client for `username`/`key` against the broker in `settings`.
    ///
    /// Port 1883 selects plain TCP; any other port uses TLS.
    pub fn new(username: &str, key: &str, settings: &Settings) -> Self {
        let client_id = format!("f451-cloud-{}", Uuid::new_v4().simple());

        let mut options = MqttOptions::new(
            client_id.clone(),
            settings.mqtt_host.clone(),
            settings.mqtt_port,
        );
        options.set_credentials(username, key);
        options.set_keep_alive(KEEP_ALIVE);

        if settings.mqtt_port != PLAIN_MQTT_PORT {
            options.set_transport(Transport::tls_with_default_config());
        }

        let (client, event_loop) = AsyncClient::new(options, REQUEST_QUEUE_CAPACITY);

        debug!(
            client_id = %client_id,
            host = %settings.mqtt_host,
            port = settings.mqtt_port,
            "MQTT client created"
        );

        Self {
            client,
            client_id,
            event_loop: Mutex::new(Some(event_loop)),
        }
    }

    /// The MQTT client used to publish and subscribe.
    pub fn client(&self) -> &AsyncClient {
        &self.client
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Hand the event loop to the caller. Returns `None` after the first call.
    pub fn take_event_loop(&self) -> Option<EventLoop> {
        self.event_loop.lock().ok().and_then(|mut slot| slot.take())
    }
}

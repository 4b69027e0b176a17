//! MQTT ingestion of probe samples.
//!
//! The ingestor subscribes to the configured topic filter and appends every
//! well-formed publish to the store, one message at a time.
//!
//! # Topic Structure
//!
//! Probes publish to `/room/{room}/env` with a JSON payload:
//!
//! ```json
//! {"t": 215, "h": 453, "d": 4}
//! ```
//!
//! `t` is the temperature in tenths of °C, `h` the relative humidity in
//! tenths of %, `d` how many seconds ago the probe took the measurement.
//!
//! # Failure Handling
//!
//! A message whose topic or payload cannot be read is logged and dropped.
//! A message that fails to store is logged and dropped. Nothing is retried.
//! Connection errors are logged and the event loop reconnects on the next
//! poll.

use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, Publish, QoS};
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use roomenv_store::Store;
use roomenv_types::{Measure, ParseError};

use crate::config::MqttConfig;
use crate::state::AppState;

/// Default MQTT port.
const DEFAULT_PORT: u16 = 1883;

/// Delay before polling again after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Errors raised while ingesting a single message.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("invalid topic, cannot get room id: {0}")]
    InvalidTopic(String),
    #[error("cannot read payload: {0}")]
    InvalidPayload(#[from] ParseError),
    #[error("cannot store sample: {0}")]
    Store(#[from] roomenv_store::Error),
}

/// MQTT subscriber that appends probe samples to the store.
pub struct Ingestor {
    state: Arc<AppState>,
}

impl Ingestor {
    /// Create a new ingestor.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Start the ingestor.
    ///
    /// Spawns a background task driving the MQTT event loop until `stop_rx`
    /// turns `true`. Returns `None` when ingestion is disabled or the broker
    /// URL is invalid.
    pub fn start(&self, stop_rx: watch::Receiver<bool>) -> Option<JoinHandle<()>> {
        let config = self.state.config.mqtt.clone();

        if !config.enabled {
            info!("MQTT ingestion is disabled");
            return None;
        }

        let (host, port) = match parse_broker_url(&config.broker) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("Invalid MQTT broker URL: {}", e);
                return None;
            }
        };

        let mut options = MqttOptions::new(&config.client_id, host, port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive));
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }

        let (client, eventloop) = AsyncClient::new(options, 100);

        info!(
            "Starting MQTT ingestion from {} on '{}'",
            config.broker, config.topic
        );

        let state = Arc::clone(&self.state);
        Some(tokio::spawn(async move {
            run_ingestor(state, config, client, eventloop, stop_rx).await;
        }))
    }
}

/// Drive the MQTT event loop.
async fn run_ingestor(
    state: Arc<AppState>,
    config: MqttConfig,
    client: AsyncClient,
    mut eventloop: EventLoop,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            event = eventloop.poll() => {
                match event {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        info!("MQTT connected: {:?}", ack);
                        // The session is not persistent, so subscribe on every connect.
                        if let Err(e) = client.subscribe(config.topic.as_str(), QoS::AtMostOnce).await {
                            error!("Failed to subscribe to '{}': {}", config.topic, e);
                        }
                    }
                    Ok(Event::Incoming(Packet::SubAck(_))) => {
                        info!("Subscribed to '{}'", config.topic);
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        ingest(&state, &publish).await;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("MQTT connection error: {}. Reconnecting...", e);
                        tokio::time::sleep(RECONNECT_DELAY).await;
                    }
                }
            }
            _ = stop_rx.changed() => {
                if *stop_rx.borrow() {
                    info!("MQTT ingestor received stop signal");
                    break;
                }
            }
        }
    }

    if let Err(e) = client.disconnect().await {
        debug!("Error disconnecting MQTT client: {}", e);
    }

    info!("MQTT ingestor stopped");
}

/// Store one publish, logging and dropping it on failure.
async fn ingest(state: &AppState, publish: &Publish) {
    debug!(
        "Received [{}] {}",
        publish.topic,
        String::from_utf8_lossy(&publish.payload)
    );

    let received_at = OffsetDateTime::now_utc();
    let store = state.store.lock().await;
    match handle_message(&store, &publish.topic, &publish.payload, received_at) {
        Ok(id) => debug!("Stored sample {} from {}", id, publish.topic),
        Err(e @ IngestError::Store(_)) => error!("Dropping message on {}: {}", publish.topic, e),
        Err(e) => warn!("Dropping message on {}: {}", publish.topic, e),
    }
}

/// Decode and append one message.
///
/// Returns the row id of the stored sample.
pub fn handle_message(
    store: &Store,
    topic: &str,
    payload: &[u8],
    received_at: OffsetDateTime,
) -> Result<i64, IngestError> {
    let room = room_from_topic(topic).ok_or_else(|| IngestError::InvalidTopic(topic.to_string()))?;
    let measure = Measure::from_json(payload)?;
    Ok(store.append(room, &measure, received_at)?)
}

/// Extract the room from a `/room/{room}/env` topic.
pub fn room_from_topic(topic: &str) -> Option<&str> {
    let room = topic.strip_prefix("/room/")?.strip_suffix("/env")?;
    if room.is_empty() || room.contains('/') {
        return None;
    }
    Some(room)
}

/// Parse an MQTT broker URL into (host, port).
///
/// Only plain `mqtt://` brokers are supported.
pub fn parse_broker_url(url: &str) -> Result<(String, u16), String> {
    let rest = url
        .strip_prefix("mqtt://")
        .ok_or_else(|| format!("Invalid scheme in '{}': URL must start with mqtt://", url))?;

    let (host, port) = match rest.rsplit_once(':') {
        Some((h, p)) => {
            let port = p.parse::<u16>().map_err(|_| format!("Invalid port: {}", p))?;
            (h.to_string(), port)
        }
        None => (rest.to_string(), DEFAULT_PORT),
    };

    if host.is_empty() {
        return Err("Host cannot be empty".to_string());
    }

    Ok((host, port))
}

//! MQTT sample collector and HTTP REST API for room environment probes.
//!
//! This crate provides a service that:
//! - Subscribes to probe publications on an MQTT broker
//! - Stores every well-formed sample in the local database
//! - Exposes a REST API for bucketed and differential series
//!
//! # REST API Endpoints
//!
//! - `GET /api/health` - Service health check
//! - `GET /api/series` - Min/avg/max per room and time bucket
//! - `GET /api/rooms` - Rooms with recent samples
//! - `GET /api/last` - Most recent sample per room
//! - `GET /api/samples` - Raw samples with pagination
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/roomenv/server.toml`:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [storage]
//! path = "/var/lib/roomenv/data.db"
//!
//! [mqtt]
//! enabled = true
//! broker = "mqtt://192.168.1.10:1883"
//! client_id = "station"
//! topic = "/room/+/env"
//!
//! [query]
//! max_rows = 5000
//! rooms_window_days = 30
//! ```

pub mod api;
pub mod config;
pub mod mqtt;
pub mod state;

pub use config::{Config, ConfigError, MqttConfig, QueryConfig, ServerConfig, StorageConfig};
pub use mqtt::{IngestError, Ingestor};
pub use state::AppState;

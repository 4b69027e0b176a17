//! Data models for stored data.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use roomenv_types::LatestSample;

/// A raw sample stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSample {
    /// Database row ID.
    pub id: i64,
    /// Room identifier.
    pub room: String,
    /// When the sample was measured.
    #[serde(with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,
    /// Temperature in Celsius.
    pub temperature: f64,
    /// Humidity percentage.
    pub humidity: f64,
}

impl StoredSample {
    /// Summary used by the "latest sample per room" view.
    pub fn to_latest(&self) -> LatestSample {
        LatestSample {
            timestamp: self.occurred_at.unix_timestamp(),
            temperature: self.temperature,
            humidity: self.humidity,
        }
    }
}

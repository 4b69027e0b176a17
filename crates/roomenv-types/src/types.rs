//! Core types for room environment data.

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::{Duration, Month, OffsetDateTime, Time};

use crate::error::{ParseError, ParseResult};

/// Maximum number of aggregated rows a single query may return.
pub const MAX_ROWS: u32 = 5000;

/// Bucket width used to group raw samples.
///
/// Each granularity has a fixed nominal duration used to size requests
/// (`month` is 30 days, `year` is 365 days). Bucket boundaries themselves are
/// calendar aligned in UTC, see [`Granularity::truncate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Granularity {
    Minute,
    #[default]
    Hour,
    Day,
    Month,
    Year,
}

impl Granularity {
    /// Every granularity, finest first.
    pub const ALL: [Granularity; 5] = [
        Granularity::Minute,
        Granularity::Hour,
        Granularity::Day,
        Granularity::Month,
        Granularity::Year,
    ];

    /// Lowercase name as used on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Minute => "minute",
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Month => "month",
            Granularity::Year => "year",
        }
    }

    /// Nominal duration of one bucket in seconds.
    #[must_use]
    pub fn seconds(&self) -> i64 {
        match self {
            Granularity::Minute => 60,
            Granularity::Hour => 3_600,
            Granularity::Day => 86_400,
            Granularity::Month => 30 * 86_400,
            Granularity::Year => 365 * 86_400,
        }
    }

    /// Truncate a UTC epoch timestamp to the start of its bucket.
    ///
    /// Minute, hour and day buckets start on the matching UTC boundary; month
    /// buckets start on the first day of the calendar month and year buckets on
    /// January 1st. Returns `None` when the instant cannot be represented as a
    /// calendar date.
    ///
    /// # Examples
    ///
    /// ```
    /// use roomenv_types::Granularity;
    ///
    /// assert_eq!(Granularity::Hour.truncate(5_432), Some(3_600));
    /// assert_eq!(Granularity::Minute.truncate(-1), Some(-60));
    /// // 2024-02-17T10:20:30Z -> 2024-02-01T00:00:00Z
    /// assert_eq!(Granularity::Month.truncate(1_708_165_230), Some(1_706_745_600));
    /// ```
    #[must_use]
    pub fn truncate(&self, timestamp: i64) -> Option<i64> {
        match self {
            Granularity::Minute | Granularity::Hour | Granularity::Day => {
                let width = self.seconds();
                Some(timestamp - timestamp.rem_euclid(width))
            }
            Granularity::Month | Granularity::Year => {
                let dt = OffsetDateTime::from_unix_timestamp(timestamp).ok()?;
                let dt = dt.replace_time(Time::MIDNIGHT).replace_day(1).ok()?;
                let dt = if *self == Granularity::Year {
                    dt.replace_month(Month::January).ok()?
                } else {
                    dt
                };
                Some(dt.unix_timestamp())
            }
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Granularity::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| ParseError::UnknownGranularity(s.to_string()))
    }
}

/// A measure as published by a room probe.
///
/// Values are integers in tenths; `offset` is the number of seconds elapsed
/// between the measurement and its publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Measure {
    /// Temperature in tenths of a degree Celsius.
    #[cfg_attr(feature = "serde", serde(rename = "t"))]
    pub temperature: i32,
    /// Relative humidity in tenths of a percent.
    #[cfg_attr(feature = "serde", serde(rename = "h"))]
    pub humidity: u16,
    /// Seconds since the measurement was taken.
    #[cfg_attr(feature = "serde", serde(rename = "d", default))]
    pub offset: u32,
}

impl Measure {
    /// Decode a probe payload such as `{"t":215,"h":453,"d":12}`.
    #[cfg(feature = "serde")]
    pub fn from_json(payload: &[u8]) -> ParseResult<Self> {
        serde_json::from_slice(payload).map_err(ParseError::InvalidPayload)
    }

    /// Temperature in degrees Celsius.
    #[must_use]
    pub fn temperature_celsius(&self) -> f64 {
        f64::from(self.temperature) / 10.0
    }

    /// Relative humidity in percent.
    #[must_use]
    pub fn humidity_percent(&self) -> f64 {
        f64::from(self.humidity) / 10.0
    }

    /// Instant the measurement was taken, given the instant it was received.
    #[must_use]
    pub fn occurred_at(&self, received_at: OffsetDateTime) -> OffsetDateTime {
        received_at - Duration::seconds(i64::from(self.offset))
    }
}

/// A normalized raw sample, as persisted.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sample {
    /// Room identifier.
    pub room: String,
    /// When the sample was measured, UTC epoch seconds.
    pub occurred_at: i64,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
}

impl Sample {
    /// Normalize a probe measure received at `received_at`.
    pub fn from_measure(room: &str, measure: &Measure, received_at: OffsetDateTime) -> Self {
        Self {
            room: room.to_string(),
            occurred_at: measure.occurred_at(received_at).unix_timestamp(),
            temperature: measure.temperature_celsius(),
            humidity: measure.humidity_percent(),
        }
    }
}

/// Aggregated values for one room over one bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bucket {
    /// Bucket start, UTC epoch seconds.
    #[cfg_attr(feature = "serde", serde(rename = "t"))]
    pub timestamp: i64,
    #[cfg_attr(feature = "serde", serde(rename = "tmin"))]
    pub temp_min: f64,
    #[cfg_attr(feature = "serde", serde(rename = "tavg"))]
    pub temp_avg: f64,
    #[cfg_attr(feature = "serde", serde(rename = "tmax"))]
    pub temp_max: f64,
    #[cfg_attr(feature = "serde", serde(rename = "hmin"))]
    pub hum_min: f64,
    #[cfg_attr(feature = "serde", serde(rename = "havg"))]
    pub hum_avg: f64,
    #[cfg_attr(feature = "serde", serde(rename = "hmax"))]
    pub hum_max: f64,
}

impl Bucket {
    /// Field-wise difference `self - reference`, stamped at `timestamp`.
    ///
    /// Each aggregate is subtracted independently (min minus min, avg minus
    /// avg, max minus max), so the result is not itself ordered.
    #[must_use]
    pub fn delta(&self, reference: &Bucket, timestamp: i64) -> Bucket {
        Bucket {
            timestamp,
            temp_min: self.temp_min - reference.temp_min,
            temp_avg: self.temp_avg - reference.temp_avg,
            temp_max: self.temp_max - reference.temp_max,
            hum_min: self.hum_min - reference.hum_min,
            hum_avg: self.hum_avg - reference.hum_avg,
            hum_max: self.hum_max - reference.hum_max,
        }
    }
}

/// Bucketed series keyed by room, each ordered by bucket start.
pub type Series = BTreeMap<String, Vec<Bucket>>;

/// Most recent raw sample of a room.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LatestSample {
    /// When the sample was measured, UTC epoch seconds.
    #[cfg_attr(feature = "serde", serde(rename = "t"))]
    pub timestamp: i64,
    pub temperature: f64,
    pub humidity: f64,
}

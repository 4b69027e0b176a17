//! Query builders for raw samples and bucketed aggregates.
//!
//! Both [`SampleQuery`] and [`AggregateQuery`] follow the builder pattern.
//! Every value that reaches SQLite (bounds, room names, bucket format and
//! limit) is bound as a statement parameter; only fixed fragments are
//! concatenated into the SQL text.
//!
//! # Example
//!
//! ```
//! use roomenv_store::{AggregateQuery, SampleQuery, Store};
//! use roomenv_types::Granularity;
//!
//! let store = Store::open_in_memory()?;
//!
//! // Hourly buckets for two rooms over one day
//! let query = AggregateQuery::new(0, 86_400, Granularity::Hour)
//!     .rooms(["kitchen", "bedroom"]);
//! query.check_row_cap()?;
//! let series = store.query_series(&query)?;
//! assert!(series.is_empty());
//!
//! // Last ten raw samples of a room
//! let samples = store.query_samples(&SampleQuery::new().room("kitchen").limit(10))?;
//! assert!(samples.is_empty());
//! # Ok::<(), roomenv_store::Error>(())
//! ```

use rusqlite::types::Value;
use time::OffsetDateTime;

use roomenv_types::{Granularity, MAX_ROWS};

use crate::error::{Error, Result};

/// Fluent query builder for raw samples.
///
/// Results are ordered by `at` descending (newest first).
#[derive(Debug, Default, Clone)]
pub struct SampleQuery {
    /// Filter by room.
    pub room: Option<String>,
    /// Filter samples at or after this time.
    pub since: Option<OffsetDateTime>,
    /// Filter samples at or before this time.
    pub until: Option<OffsetDateTime>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Offset for pagination.
    pub offset: Option<u32>,
}

impl SampleQuery {
    /// Create a new query over all rooms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only include samples from the given room.
    pub fn room(mut self, room: &str) -> Self {
        self.room = Some(room.to_string());
        self
    }

    /// Filter to samples measured at or after this time.
    pub fn since(mut self, time: OffsetDateTime) -> Self {
        self.since = Some(time);
        self
    }

    /// Filter to samples measured at or before this time.
    pub fn until(mut self, time: OffsetDateTime) -> Self {
        self.until = Some(time);
        self
    }

    /// Limit the maximum number of results returned.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first N results.
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }


    /// Build the SQL statement and its parameters.
    pub(crate) fn build(&self) -> (String, Vec<Value>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if let Some(ref room) = self.room {
            conditions.push("room = ?");
            params.push(Value::Text(room.clone()));
        }

        if let Some(since) = self.since {
            conditions.push("at >= ?");
            params.push(Value::Integer(since.unix_timestamp()));
        }

        if let Some(until) = self.until {
            conditions.push("at <= ?");
            params.push(Value::Integer(until.unix_timestamp()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        // Row id breaks ties between samples sharing a timestamp
        let mut sql = format!(
            "SELECT uid, room, at, temperature, humidity FROM environment {} \
             ORDER BY at DESC, uid DESC",
            where_clause
        );

        // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded
        if self.limit.is_some() || self.offset.is_some() {
            sql.push_str(" LIMIT ?");
            params.push(Value::Integer(self.limit.map_or(-1, i64::from)));
        }
        if let Some(offset) = self.offset {
            sql.push_str(" OFFSET ?");
            params.push(Value::Integer(i64::from(offset)));
        }

        (sql, params)
    }
}

/// Bucketed aggregation over a time range.
///
/// Selects raw samples with `from <= at <= to`, truncates each timestamp to
/// the start of its [`Granularity`] window (UTC) and reports min/avg/max of
/// temperature and humidity per room and bucket. Rows come back ordered by
/// room, then bucket start, and never exceed `limit` (default [`MAX_ROWS`]).
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateQuery {
    /// Range start, UTC epoch seconds (inclusive).
    pub from: i64,
    /// Range end, UTC epoch seconds (inclusive).
    pub to: i64,
    /// Bucket width.
    pub by: Granularity,
    /// Rooms to aggregate; empty means every room.
    pub rooms: Vec<String>,
    /// Hard cap on returned rows.
    pub limit: u32,
}

impl AggregateQuery {
    /// Create a query over `[from, to]` for every room.
    pub fn new(from: i64, to: i64, by: Granularity) -> Self {
        Self {
            from,
            to,
            by,
            rooms: Vec::new(),
            limit: MAX_ROWS,
        }
    }

    /// Restrict the aggregation to the given rooms.
    pub fn rooms<I, S>(mut self, rooms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rooms = rooms.into_iter().map(Into::into).collect();
        self
    }

    /// Override the row cap.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Whether the range selects nothing by construction.
    pub fn is_empty_range(&self) -> bool {
        self.to <= self.from
    }

    /// Number of buckets the range spans at this granularity, rounded up.
    pub fn requested_buckets(&self) -> i64 {
        let span = self.to.saturating_sub(self.from).max(0);
        let width = self.by.seconds();
        span / width + i64::from(span % width != 0)
    }

    /// Reject ranges that would produce more than `limit` buckets per room.
    ///
    /// A range is too large when `(to - from) / duration > limit`. Call this
    /// before [`Store::query_series`](crate::Store::query_series); the
    /// statement's own `LIMIT` silently drops trailing rows otherwise.
    pub fn check_row_cap(&self) -> Result<()> {
        let span = self.to.saturating_sub(self.from);
        let max_span = i64::from(self.limit).saturating_mul(self.by.seconds());
        if span > max_span {
            return Err(Error::TooManyRows {
                requested: self.requested_buckets(),
                max: self.limit,
            });
        }
        Ok(())
    }

    /// `strftime` format and literal suffix rebuilding the bucket start.
    fn bucket_format(&self) -> (&'static str, &'static str) {
        match self.by {
            Granularity::Minute => ("%Y-%m-%d %H:%M", ":00"),
            Granularity::Hour => ("%Y-%m-%d %H", ":00:00"),
            Granularity::Day => ("%Y-%m-%d", " 00:00:00"),
            Granularity::Month => ("%Y-%m", "-01 00:00:00"),
            Granularity::Year => ("%Y", "-01-01 00:00:00"),
        }
    }

    /// Build the SQL statement and its parameters.
    pub(crate) fn build(&self) -> (String, Vec<Value>) {
        let (format, suffix) = self.bucket_format();
        let mut params = vec![
            Value::Text(format.to_string()),
            Value::Text(suffix.to_string()),
            Value::Integer(self.from),
            Value::Integer(self.to),
        ];

        let room_filter = if self.rooms.is_empty() {
            String::new()
        } else {
            let placeholders = vec!["?"; self.rooms.len()].join(", ");
            params.extend(self.rooms.iter().cloned().map(Value::Text));
            format!("AND room IN ({})", placeholders)
        };
        params.push(Value::Integer(i64::from(self.limit)));

        let sql = format!(
            "SELECT room, \
             CAST(strftime('%s', strftime(?, at, 'unixepoch') || ?) AS INTEGER) AS t, \
             MIN(temperature), AVG(temperature), MAX(temperature), \
             MIN(humidity), AVG(humidity), MAX(humidity) \
             FROM environment \
             WHERE at >= ? AND at <= ? {} \
             GROUP BY room, t \
             ORDER BY room ASC, t ASC \
             LIMIT ?",
            room_filter
        );

        (sql, params)
    }
}

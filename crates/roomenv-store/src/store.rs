//! Main store implementation.

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::{Connection, Row, params_from_iter};
use time::OffsetDateTime;
use tracing::{debug, info};

use roomenv_types::{Bucket, LatestSample, Measure, Sample, Series};

use crate::error::{Error, Result};
use crate::models::StoredSample;
use crate::queries::{AggregateQuery, SampleQuery};
use crate::schema;

/// SQLite-based store for room samples.
///
/// The store owns a single connection. Samples are only ever appended; every
/// read recomputes its result from the raw rows.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        // WAL lets readers see committed appends without blocking the writer
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }
}

// Write path
impl Store {
    /// Append a probe measure received at `received_at`.
    ///
    /// The stored instant is `received_at - measure.offset`. Returns the new
    /// row id.
    pub fn append(&self, room: &str, measure: &Measure, received_at: OffsetDateTime) -> Result<i64> {
        let sample = Sample::from_measure(room, measure, received_at);
        self.insert_sample(&sample)
    }

    /// Insert an already normalized sample.
    ///
    /// Rows are never updated; the instant is stored as given, including
    /// instants before the epoch.
    pub fn insert_sample(&self, sample: &Sample) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO environment (at, room, temperature, humidity) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                sample.occurred_at,
                sample.room,
                sample.temperature,
                sample.humidity,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!(
            "Stored sample {} for {} at {} (t={}, h={})",
            id, sample.room, sample.occurred_at, sample.temperature, sample.humidity
        );
        Ok(id)
    }
}

// Aggregation
impl Store {
    /// Aggregate raw samples into per-room buckets.
    ///
    /// An empty or inverted range yields an empty collection. The row cap is
    /// not checked here, see [`AggregateQuery::check_row_cap`].
    pub fn query_series(&self, query: &AggregateQuery) -> Result<Series> {
        let mut series = Series::new();
        if query.is_empty_range() {
            return Ok(series);
        }

        let (sql, params) = query.build();
        debug!(
            "Executing aggregation by {} over [{}, {}] for {:?}: {}",
            query.by, query.from, query.to, query.rooms, sql
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(params.iter()))?;

        let mut count = 0usize;
        while let Some(row) = rows.next()? {
            let room: String = row.get(0)?;
            let bucket = Bucket {
                timestamp: row.get(1)?,
                temp_min: row.get(2)?,
                temp_avg: row.get(3)?,
                temp_max: row.get(4)?,
                hum_min: row.get(5)?,
                hum_avg: row.get(6)?,
                hum_max: row.get(7)?,
            };
            series.entry(room).or_default().push(bucket);
            count += 1;
        }

        debug!("Aggregation returned {} bucket(s) for {} room(s)", count, series.len());
        Ok(series)
    }
}

// Room directory and raw samples
impl Store {
    /// Distinct rooms with at least one sample at or after `since`.
    pub fn list_rooms(&self, since: OffsetDateTime) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT room FROM environment WHERE at >= ? ORDER BY room ASC")?;

        let rooms = stmt
            .query_map([since.unix_timestamp()], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(rooms)
    }

    /// Query raw samples with filters.
    pub fn query_samples(&self, query: &SampleQuery) -> Result<Vec<StoredSample>> {
        let (sql, params) = query.build();

        debug!("Executing query: {}", sql);

        let mut stmt = self.conn.prepare(&sql)?;
        let samples = stmt
            .query_map(params_from_iter(params.iter()), sample_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(samples)
    }

    /// Get the most recent sample of a room.
    pub fn get_latest_sample(&self, room: &str) -> Result<Option<StoredSample>> {
        let query = SampleQuery::new().room(room).limit(1);
        let mut samples = self.query_samples(&query)?;
        Ok(samples.pop())
    }

    /// Most recent sample of every room active since `since`.
    pub fn latest_samples(&self, since: OffsetDateTime) -> Result<BTreeMap<String, LatestSample>> {
        let mut latest = BTreeMap::new();
        for room in self.list_rooms(since)? {
            if let Some(sample) = self.get_latest_sample(&room)? {
                latest.insert(room, sample.to_latest());
            }
        }
        Ok(latest)
    }
}

fn sample_from_row(row: &Row<'_>) -> rusqlite::Result<StoredSample> {
    let at: i64 = row.get(2)?;
    let occurred_at = OffsetDateTime::from_unix_timestamp(at).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Integer, Box::new(e))
    })?;

    Ok(StoredSample {
        id: row.get(0)?,
        room: row.get(1)?,
        occurred_at,
        temperature: row.get(3)?,
        humidity: row.get(4)?,
    })
}

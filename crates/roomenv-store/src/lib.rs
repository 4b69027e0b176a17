//! Local persistence and aggregation for room environment samples.
//!
//! This crate provides SQLite-based storage for raw temperature/humidity
//! samples and the read-side computations built on it.
//!
//! # Features
//!
//! - Append-only sample table with offset-corrected timestamps
//! - Bucketed min/avg/max aggregation by minute, hour, day, month or year
//! - Row cap validation for aggregation requests
//! - Recently active room directory and latest sample per room
//! - Differential series against a reference room
//!
//! # Example
//!
//! ```no_run
//! use roomenv_store::{AggregateQuery, Store};
//! use roomenv_types::{Granularity, Measure};
//! use time::OffsetDateTime;
//!
//! let store = Store::open(roomenv_store::default_db_path())?;
//!
//! let measure = Measure { temperature: 215, humidity: 453, offset: 4 };
//! store.append("kitchen", &measure, OffsetDateTime::now_utc())?;
//!
//! let query = AggregateQuery::new(0, 86_400, Granularity::Hour).rooms(["kitchen"]);
//! query.check_row_cap()?;
//! let series = store.query_series(&query)?;
//! let relative = roomenv_store::diff("outside", Granularity::Hour, &series);
//! # let _ = relative;
//! # Ok::<(), roomenv_store::Error>(())
//! ```

mod diff;
mod error;
mod models;
mod queries;
mod schema;
mod store;

pub use diff::diff;
pub use error::{Error, Result};
pub use models::StoredSample;
pub use queries::{AggregateQuery, SampleQuery};
pub use store::Store;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/roomenv/data.db`
/// - macOS: `~/Library/Application Support/roomenv/data.db`
/// - Windows: `C:\Users\<user>\AppData\Local\roomenv\data.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("roomenv")
        .join("data.db")
}

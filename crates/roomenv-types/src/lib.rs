//! Platform-agnostic types for room environment monitoring.
//!
//! This crate provides the value types shared by the sample store and the
//! station service: probe payloads, normalized samples, time granularities
//! and aggregated series.
//!
//! # Example
//!
//! ```
//! use roomenv_types::{Granularity, Measure};
//!
//! let measure = Measure::from_json(br#"{"t":215,"h":453,"d":12}"#)?;
//! assert_eq!(measure.temperature_celsius(), 21.5);
//!
//! let by: Granularity = "day".parse()?;
//! assert_eq!(by.truncate(90_000), Some(86_400));
//! # Ok::<(), roomenv_types::ParseError>(())
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{Bucket, Granularity, LatestSample, MAX_ROWS, Measure, Sample, Series};

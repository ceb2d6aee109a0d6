#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/growth/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types and the time-series aggregation engine.
//!
//! - [`Coordinate`](quarter::Coordinate) - Canonical (year, quarter) grid position
//! - [`LookbackKind`](quarter::LookbackKind) - Comparison horizons and their offsets
//! - [`TimeSeriesStore`](store::TimeSeriesStore) - Deduplicating store abstraction
//! - [`GrowthCalculator`](calculator::GrowthCalculator) - Growth rows over a store

/// Growth percentage calculation.
pub mod calculator;
/// Error types for growth operations.
pub mod error;
/// Quarter grid and lookback offsets.
pub mod quarter;
/// Store trait for the shared time series.
pub mod store;
/// Core data types (CompanyRecord, TimeSeriesCell, GrowthRow, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use calculator::{GrowthCalculator, growth_pct};
pub use error::{GrowthError, Result};
pub use quarter::{Coordinate, LookbackKind, Quarter, offset_coordinate, quarter_of};
pub use store::TimeSeriesStore;
pub use types::{
    CompanyRecord, GrowthRow, SubmissionMeta, TimeSeriesCell, Upsert, sanitize_name,
};

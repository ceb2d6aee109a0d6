#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/growth/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Growth percentages of SEC balance sheet measures.
//!
//! This crate re-exports the core types, stores and data set readers, and
//! provides a [`Pipeline`] that merges many quarterly data sets into one time
//! series and writes growth rows.
//!
//! # Features
//!
//! - `sqlite` - SQLite-backed time-series store (default)
//!
//! # Example
//!
//! ```rust,ignore
//! use growth::{Pipeline, PipelineConfig};
//!
//! fn main() -> growth::Result<()> {
//!     let config = PipelineConfig::from_json_file("growth.json")?;
//!     let summary = Pipeline::new(config)?.run()?;
//!
//!     println!(
//!         "{} pairs merged, {} missing, {} rows written",
//!         summary.build.pairs.len(),
//!         summary.build.missing.len(),
//!         summary.rows_written()
//!     );
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use growth_core::*;

// Stores
#[cfg(feature = "sqlite")]
pub use growth_store::SqliteStore;
pub use growth_store::InMemoryStore;

// Data set readers
pub use growth_edgar::{
    FilePair, IndexReport, MergeReport, PairReport, Period, SubmissionIndex, TimeSeriesBuilder,
    periods,
};

mod config;
pub use config::{OutputFormat, PipelineConfig, StoreConfig};

pub mod export;

mod pipeline;
pub use pipeline::{BuildSummary, Pipeline, RunSummary, write_rows};

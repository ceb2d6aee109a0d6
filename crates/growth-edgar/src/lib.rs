#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/growth/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC financial statement data set readers.
//!
//! This crate turns the quarterly `sub.txt`/`num.txt` archives into a
//! deduplicated time series:
//!
//! - [`TsvRecords`] - Tab-separated record iterator with unreadable-line detection
//! - [`SubmissionIndex`] - `adsh` to filer CIK, name and filing date
//! - [`TimeSeriesBuilder`] - Filters facts and merges them into a store
//! - [`FilePair`] / [`Period`] - Locate one quarter's files
//!
//! # Example
//!
//! ```no_run
//! use growth_edgar::{FilePair, Period, TimeSeriesBuilder};
//! use growth_store::InMemoryStore;
//!
//! fn main() -> growth_core::Result<()> {
//!     let builder = TimeSeriesBuilder::new(["Assets"])?;
//!     let mut store = InMemoryStore::new();
//!
//!     let period: Period = "2019q1".parse()?;
//!     let report = builder.merge_pair(&FilePair::resolve("data", period), &mut store)?;
//!     println!("{} facts merged, {} unreadable", report.merge.merged(), report.merge.unreadable);
//!
//!     Ok(())
//! }
//! ```

/// Fact filtering and merging.
pub mod facts;
/// File pair and period naming.
pub mod pairs;
/// Tab-separated record reading.
pub mod records;
/// Submission index.
pub mod submissions;

pub use facts::{Fact, MergeReport, PairReport, TimeSeriesBuilder};
pub use pairs::{FilePair, Period, periods};
pub use records::{Record, TsvRecords, parse_yyyymmdd};
pub use submissions::{IndexReport, SubmissionIndex};

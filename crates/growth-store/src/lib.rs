#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/growth/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Time-series store implementations.
//!
//! This crate provides implementations of the [`TimeSeriesStore`] trait from `growth-core`:
//!
//! - [`InMemoryStore`] - Hash-map backed store for a single run (default)
//! - [`SqliteStore`] - Persistent SQLite-backed store (requires `sqlite` feature)

/// In-memory store implementation.
pub mod memory;

/// SQLite-based store implementation.
#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export the trait for convenience
pub use growth_core::TimeSeriesStore;

// Re-export implementations
pub use memory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

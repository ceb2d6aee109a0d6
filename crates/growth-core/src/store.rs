//! Store trait for the shared per-company time series.
//!
//! This module defines the [`TimeSeriesStore`] trait that the time-series
//! builder writes into and the growth calculator reads from.

use std::fmt::Debug;

use crate::{
    error::Result,
    quarter::Coordinate,
    types::{CompanyRecord, TimeSeriesCell, Upsert},
};

/// Trait for holding the deduplicated time series of a run.
///
/// A store keeps at most one [`TimeSeriesCell`] per
/// (company, measure, [`Coordinate`]). Implementations must apply the
/// most-recently-filed-wins rule in [`upsert`](Self::upsert) and must return
/// companies in the order they were first observed.
pub trait TimeSeriesStore: Debug {
    /// Merges a cell into the store.
    ///
    /// Creates `company` if its key has not been seen; an existing company
    /// keeps the name it was first recorded with. The cell is written when the
    /// coordinate is empty or when `cell` was filed strictly later than the
    /// stored cell.
    fn upsert(
        &mut self,
        company: &CompanyRecord,
        measure: &str,
        coordinate: Coordinate,
        cell: TimeSeriesCell,
    ) -> Result<Upsert>;

    /// Returns the cell at a coordinate, or `Ok(None)` if it is empty.
    fn cell(&self, cik: &str, measure: &str, coordinate: Coordinate)
    -> Result<Option<TimeSeriesCell>>;

    /// Returns all companies in first-observed order.
    fn companies(&self) -> Result<Vec<CompanyRecord>>;

    /// Returns the total number of stored cells across all companies and measures.
    fn cell_count(&self) -> Result<usize>;

    /// Starts grouping upserts until [`end_batch`](Self::end_batch).
    ///
    /// Stores without a write cost per call keep the default no-op.
    fn begin_batch(&mut self) -> Result<()> {
        Ok(())
    }

    /// Makes the upserts since [`begin_batch`](Self::begin_batch) durable.
    fn end_batch(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: TimeSeriesStore + ?Sized> TimeSeriesStore for Box<S> {
    fn upsert(
        &mut self,
        company: &CompanyRecord,
        measure: &str,
        coordinate: Coordinate,
        cell: TimeSeriesCell,
    ) -> Result<Upsert> {
        (**self).upsert(company, measure, coordinate, cell)
    }

    fn cell(
        &self,
        cik: &str,
        measure: &str,
        coordinate: Coordinate,
    ) -> Result<Option<TimeSeriesCell>> {
        (**self).cell(cik, measure, coordinate)
    }

    fn companies(&self) -> Result<Vec<CompanyRecord>> {
        (**self).companies()
    }

    fn cell_count(&self) -> Result<usize> {
        (**self).cell_count()
    }

    fn begin_batch(&mut self) -> Result<()> {
        (**self).begin_batch()
    }

    fn end_batch(&mut self) -> Result<()> {
        (**self).end_batch()
    }
}

//! In-memory store implementation.

use growth_core::{
    CompanyRecord, Coordinate, Result, TimeSeriesCell, TimeSeriesStore, Upsert,
};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::trace;

/// One company's cells, grouped by measure.
#[derive(Debug, Clone)]
struct CompanySeries {
    record: CompanyRecord,
    measures: HashMap<String, HashMap<Coordinate, TimeSeriesCell>>,
}

/// Hash-map backed store for a single run.
///
/// Companies are kept in the order they were first observed, which is the
/// order the growth calculator emits them in.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    order: Vec<String>,
    series: HashMap<String, CompanySeries>,
    cells: usize,
}

impl InMemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of companies in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if no company has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns the company record for a key.
    #[must_use]
    pub fn company(&self, cik: &str) -> Option<&CompanyRecord> {
        self.series.get(cik).map(|s| &s.record)
    }

    /// Returns all cells of one company and measure, ordered by coordinate.
    #[must_use]
    pub fn series(&self, cik: &str, measure: &str) -> Vec<(Coordinate, TimeSeriesCell)> {
        let mut cells: Vec<_> = self
            .series
            .get(cik)
            .and_then(|s| s.measures.get(measure))
            .map(|m| m.iter().map(|(c, cell)| (*c, *cell)).collect())
            .unwrap_or_default();
        cells.sort_by_key(|(c, _)| *c);
        cells
    }
}

impl TimeSeriesStore for InMemoryStore {
    fn upsert(
        &mut self,
        company: &CompanyRecord,
        measure: &str,
        coordinate: Coordinate,
        cell: TimeSeriesCell,
    ) -> Result<Upsert> {
        let series = match self.series.entry(company.cik.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                trace!(cik = %company.cik, name = %company.name, "New company");
                self.order.push(company.cik.clone());
                entry.insert(CompanySeries {
                    record: company.clone(),
                    measures: HashMap::new(),
                })
            }
        };

        let cells = series.measures.entry(measure.to_string()).or_default();
        let outcome = match cells.entry(coordinate) {
            Entry::Vacant(entry) => {
                entry.insert(cell);
                self.cells += 1;
                Upsert::Inserted
            }
            Entry::Occupied(mut entry) => {
                if entry.get().superseded_by(&cell) {
                    entry.insert(cell);
                    Upsert::Replaced
                } else {
                    Upsert::Retained
                }
            }
        };
        Ok(outcome)
    }

    fn cell(
        &self,
        cik: &str,
        measure: &str,
        coordinate: Coordinate,
    ) -> Result<Option<TimeSeriesCell>> {
        Ok(self
            .series
            .get(cik)
            .and_then(|s| s.measures.get(measure))
            .and_then(|m| m.get(&coordinate))
            .copied())
    }

    fn companies(&self) -> Result<Vec<CompanyRecord>> {
        Ok(self
            .order
            .iter()
            .filter_map(|cik| self.series.get(cik))
            .map(|s| s.record.clone())
            .collect())
    }

    fn cell_count(&self) -> Result<usize> {
        Ok(self.cells)
    }
}

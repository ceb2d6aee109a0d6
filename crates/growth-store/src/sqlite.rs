//! SQLite-based store implementation.

use chrono::NaiveDate;
use growth_core::{
    CompanyRecord, Coordinate, GrowthError, Result, TimeSeriesCell, TimeSeriesStore, Upsert,
};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use tracing::{debug, instrument};

/// SQLite-backed store.
///
/// The series survives across runs, so periods merged by an earlier run do not
/// need to be read again. The filed-date comparison is part of the upsert
/// statement itself. Outside a batch each upsert commits on its own; inside
/// one, everything up to [`end_batch`](TimeSeriesStore::end_batch) commits
/// together.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

fn store_err(e: rusqlite::Error) -> GrowthError {
    GrowthError::Store(e.to_string())
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(store_err)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")
            .map_err(store_err)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite store.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        // rowid order on companies is first-observed order
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS companies (
                    cik TEXT PRIMARY KEY NOT NULL,
                    name TEXT NOT NULL
                )",
                [],
            )
            .map_err(store_err)?;

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS cells (
                    cik TEXT NOT NULL,
                    measure TEXT NOT NULL,
                    year INTEGER NOT NULL,
                    quarter INTEGER NOT NULL,
                    value REAL NOT NULL,
                    ddate TEXT NOT NULL,
                    filed TEXT NOT NULL,
                    PRIMARY KEY (cik, measure, year, quarter)
                )",
                [],
            )
            .map_err(store_err)?;

        debug!("SQLite store schema initialized");
        Ok(())
    }

    fn parse_date(s: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| GrowthError::Store(format!("Invalid stored date '{s}': {e}")))
    }

    /// Runs the upsert statements on `conn`, which is either the open batch or
    /// a per-call transaction.
    fn write_cell(
        conn: &Connection,
        company: &CompanyRecord,
        measure: &str,
        coordinate: Coordinate,
        cell: TimeSeriesCell,
    ) -> Result<Upsert> {
        conn.prepare_cached("INSERT OR IGNORE INTO companies (cik, name) VALUES (?1, ?2)")
            .map_err(store_err)?
            .execute(params![company.cik, company.name])
            .map_err(store_err)?;

        let previous: Option<String> = conn
            .prepare_cached(
                "SELECT filed FROM cells
                 WHERE cik = ?1 AND measure = ?2 AND year = ?3 AND quarter = ?4",
            )
            .map_err(store_err)?
            .query_row(
                params![company.cik, measure, coordinate.year, coordinate.quarter.index()],
                |row| row.get(0),
            )
            .optional()
            .map_err(store_err)?;

        // ISO dates compare correctly as text
        let changed = conn
            .prepare_cached(
                "INSERT INTO cells (cik, measure, year, quarter, value, ddate, filed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT (cik, measure, year, quarter) DO UPDATE SET
                    value = excluded.value,
                    ddate = excluded.ddate,
                    filed = excluded.filed
                 WHERE excluded.filed > cells.filed",
            )
            .map_err(store_err)?
            .execute(params![
                company.cik,
                measure,
                coordinate.year,
                coordinate.quarter.index(),
                cell.value,
                cell.ddate.to_string(),
                cell.filed.to_string(),
            ])
            .map_err(store_err)?;

        Ok(match (previous, changed) {
            (None, _) => Upsert::Inserted,
            (Some(_), 0) => Upsert::Retained,
            (Some(_), _) => Upsert::Replaced,
        })
    }
}

impl TimeSeriesStore for SqliteStore {
    #[instrument(skip(self, company, cell), fields(cik = %company.cik, coordinate = %coordinate))]
    fn upsert(
        &mut self,
        company: &CompanyRecord,
        measure: &str,
        coordinate: Coordinate,
        cell: TimeSeriesCell,
    ) -> Result<Upsert> {
        if !self.conn.is_autocommit() {
            return Self::write_cell(&self.conn, company, measure, coordinate, cell);
        }
        let tx = self.conn.transaction().map_err(store_err)?;
        let outcome = Self::write_cell(&tx, company, measure, coordinate, cell)?;
        tx.commit().map_err(store_err)?;
        Ok(outcome)
    }

    fn cell(
        &self,
        cik: &str,
        measure: &str,
        coordinate: Coordinate,
    ) -> Result<Option<TimeSeriesCell>> {
        let row: Option<(f64, String, String)> = self
            .conn
            .prepare_cached(
                "SELECT value, ddate, filed FROM cells
                 WHERE cik = ?1 AND measure = ?2 AND year = ?3 AND quarter = ?4",
            )
            .map_err(store_err)?
            .query_row(
                params![cik, measure, coordinate.year, coordinate.quarter.index()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(store_err)?;

        row.map(|(value, ddate, filed)| {
            Ok(TimeSeriesCell::new(
                value,
                Self::parse_date(&ddate)?,
                Self::parse_date(&filed)?,
            ))
        })
        .transpose()
    }

    fn companies(&self) -> Result<Vec<CompanyRecord>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT cik, name FROM companies ORDER BY rowid")
            .map_err(store_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CompanyRecord {
                    cik: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(store_err)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(store_err)
    }

    fn cell_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM cells", [], |row| row.get(0))
            .map_err(store_err)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn begin_batch(&mut self) -> Result<()> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN").map_err(store_err)?;
            debug!("Batch started");
        }
        Ok(())
    }

    fn end_batch(&mut self) -> Result<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT").map_err(store_err)?;
            debug!("Batch committed");
        }
        Ok(())
    }
}

//! Growth row output: append-only CSV, `DataFrame` and Parquet.

use chrono::{Datelike, NaiveDate};
use growth_core::{GrowthError, GrowthRow, Result};
use polars::prelude::*;
use serde::Serialize;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Days from 0001-01-01 to 1970-01-01.
const UNIX_EPOCH_FROM_CE: i32 = 719_163;

/// Output column names, in order.
pub const HEADER: [&str; 8] = [
    "CIK",
    "NAME",
    "DDATE",
    "MEASURE",
    "QOQ_GROWTH",
    "YOY_GROWTH",
    "3Y_GROWTH",
    "5Y_GROWTH",
];

#[derive(Serialize)]
struct CsvRow<'a> {
    cik: &'a str,
    name: &'a str,
    ddate: NaiveDate,
    measure: &'a str,
    qoq: Option<f64>,
    yoy: Option<f64>,
    three_year: Option<f64>,
    five_year: Option<f64>,
}

impl<'a> From<&'a GrowthRow> for CsvRow<'a> {
    fn from(row: &'a GrowthRow) -> Self {
        Self {
            cik: &row.cik,
            name: &row.name,
            ddate: row.ddate,
            measure: &row.measure,
            qoq: row.qoq,
            yoy: row.yoy,
            three_year: row.three_year,
            five_year: row.five_year,
        }
    }
}

/// Streams growth rows as CSV. Undefined percentages are written as empty fields.
pub struct CsvRowWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl<W: Write> fmt::Debug for CsvRowWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsvRowWriter")
            .field("rows", &self.rows)
            .finish_non_exhaustive()
    }
}

impl<W: Write> CsvRowWriter<W> {
    /// Wraps `writer`, writing the header line first when `header` is set.
    ///
    /// # Errors
    /// Returns [`GrowthError::Export`] if the header cannot be written.
    pub fn new(writer: W, header: bool) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        if header {
            writer.write_record(HEADER).map_err(export_err)?;
        }
        Ok(Self { writer, rows: 0 })
    }

    /// Writes one row.
    ///
    /// # Errors
    /// Returns [`GrowthError::Export`] on serialization or write failure.
    pub fn write(&mut self, row: &GrowthRow) -> Result<()> {
        self.writer
            .serialize(CsvRow::from(row))
            .map_err(export_err)?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Flushes buffered output and returns the number of rows written.
    ///
    /// # Errors
    /// Returns [`GrowthError::Io`] if the flush fails.
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        Ok(self.rows)
    }
}

/// Appends rows to a CSV file, creating it if needed.
///
/// The header is written only when the file is new or empty, so repeated runs
/// accumulate rows under a single header.
///
/// # Errors
/// Returns [`GrowthError::Io`] if the file cannot be opened and
/// [`GrowthError::Export`] if a row cannot be written.
pub fn append_csv(path: impl AsRef<Path>, rows: &[GrowthRow]) -> Result<usize> {
    let path = path.as_ref();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let header = file.metadata()?.len() == 0;

    let mut writer = CsvRowWriter::new(file, header)?;
    for row in rows {
        writer.write(row)?;
    }
    let written = writer.finish()?;

    debug!(path = %path.display(), rows = written, header, "Appended growth rows");
    Ok(written)
}

/// Converts growth rows into a `DataFrame` with the output column names.
///
/// `DDATE` is a `Date` column; percentages are nullable `f64`.
///
/// # Errors
/// Returns [`GrowthError::Export`] if the frame cannot be assembled.
pub fn rows_to_frame(rows: &[GrowthRow]) -> Result<DataFrame> {
    let ciks: Vec<&str> = rows.iter().map(|r| r.cik.as_str()).collect();
    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    let days: Vec<i32> = rows
        .iter()
        .map(|r| r.ddate.num_days_from_ce() - UNIX_EPOCH_FROM_CE)
        .collect();
    let measures: Vec<&str> = rows.iter().map(|r| r.measure.as_str()).collect();
    let percent = |pick: fn(&GrowthRow) -> Option<f64>| -> Vec<Option<f64>> {
        rows.iter().map(pick).collect()
    };

    let ddate = Column::new(HEADER[2].into(), days)
        .cast(&DataType::Date)
        .map_err(|e| GrowthError::Export(e.to_string()))?;

    DataFrame::new(vec![
        Column::new(HEADER[0].into(), ciks),
        Column::new(HEADER[1].into(), names),
        ddate,
        Column::new(HEADER[3].into(), measures),
        Column::new(HEADER[4].into(), percent(|r| r.qoq)),
        Column::new(HEADER[5].into(), percent(|r| r.yoy)),
        Column::new(HEADER[6].into(), percent(|r| r.three_year)),
        Column::new(HEADER[7].into(), percent(|r| r.five_year)),
    ])
    .map_err(|e| GrowthError::Export(e.to_string()))
}

/// Writes rows to a Parquet file, replacing any existing file.
///
/// # Errors
/// Returns [`GrowthError::Io`] if the file cannot be created and
/// [`GrowthError::Export`] if encoding fails.
pub fn write_parquet(path: impl AsRef<Path>, rows: &[GrowthRow]) -> Result<usize> {
    let path = path.as_ref();
    let mut df = rows_to_frame(rows)?;
    let file = File::create(path)?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| GrowthError::Export(e.to_string()))?;

    debug!(path = %path.display(), rows = rows.len(), "Wrote growth parquet");
    Ok(rows.len())
}

fn export_err(e: csv::Error) -> GrowthError {
    GrowthError::Export(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cik: &str, yoy: Option<f64>) -> GrowthRow {
        GrowthRow {
            cik: cik.to_string(),
            name: "Acme Inc".to_string(),
            ddate: NaiveDate::from_ymd_opt(2019, 12, 31).unwrap(),
            measure: "Assets".to_string(),
            qoq: None,
            yoy,
            three_year: None,
            five_year: Some(-12.5),
        }
    }

    #[test]
    fn test_csv_writer_formats_rows() {
        let mut bytes = Vec::new();
        let mut writer = CsvRowWriter::new(&mut bytes, true).unwrap();
        writer.write(&row("1", Some(50.0))).unwrap();
        assert_eq!(writer.rows(), 1);
        assert_eq!(writer.finish().unwrap(), 1);

        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("CIK,NAME,DDATE,MEASURE,QOQ_GROWTH,YOY_GROWTH,3Y_GROWTH,5Y_GROWTH")
        );
        assert_eq!(lines.next(), Some("1,Acme Inc,2019-12-31,Assets,,50.0,,-12.5"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("growth.csv");

        assert_eq!(append_csv(&path, &[row("1", Some(1.0))]).unwrap(), 1);
        assert_eq!(append_csv(&path, &[row("2", None)]).unwrap(), 1);
        assert_eq!(append_csv(&path, &[]).unwrap(), 0);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("CIK,"));
        assert!(lines[1].starts_with("1,"));
        assert!(lines[2].starts_with("2,"));
    }

    #[test]
    fn test_empty_output_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("growth.csv");
        append_csv(&path, &[]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_rows_to_frame() {
        let df = rows_to_frame(&[row("1", Some(50.0)), row("2", None)]).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 8);
        assert_eq!(df.column("DDATE").unwrap().dtype(), &DataType::Date);

        let yoy = df
            .column("YOY_GROWTH")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .clone();
        assert_eq!(yoy.get(0), Some(50.0));
        assert_eq!(yoy.get(1), None);
    }

    #[test]
    fn test_write_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("growth.parquet");
        assert_eq!(write_parquet(&path, &[row("1", Some(2.5))]).unwrap(), 1);
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}

//! Core data types for the growth time series.
//!
//! - [`CompanyRecord`] - Company key and display name
//! - [`SubmissionMeta`] - Company metadata of one filing, keyed by submission id
//! - [`TimeSeriesCell`] - One deduplicated value on the quarter grid
//! - [`Upsert`] - Outcome of merging a cell into a store
//! - [`GrowthRow`] - One output row of growth percentages

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::quarter::LookbackKind;

/// Removes commas from a company name so it can sit in an unquoted CSV field.
#[must_use]
pub fn sanitize_name(raw: &str) -> String {
    raw.replace(',', "")
}

/// A company observed in the fact stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    /// SEC central index key, stable across filings.
    pub cik: String,
    /// Display name, commas removed.
    pub name: String,
}

impl CompanyRecord {
    /// Creates a company record, stripping commas from the name.
    #[must_use]
    pub fn new(cik: impl Into<String>, name: &str) -> Self {
        Self {
            cik: cik.into(),
            name: sanitize_name(name),
        }
    }
}

/// Metadata of one submission (filing).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionMeta {
    /// Company key of the filer.
    pub cik: String,
    /// Display name of the filer, commas removed.
    pub name: String,
    /// Date the submission was filed with the SEC.
    pub filed: NaiveDate,
}

impl SubmissionMeta {
    /// Returns the company record this submission belongs to.
    #[must_use]
    pub fn company(&self) -> CompanyRecord {
        CompanyRecord {
            cik: self.cik.clone(),
            name: self.name.clone(),
        }
    }
}

/// A value stored at one (company, measure, year, quarter) coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesCell {
    /// Reported value.
    pub value: f64,
    /// Observation (balance sheet) date of the value.
    pub ddate: NaiveDate,
    /// Filing date of the submission that reported the value.
    pub filed: NaiveDate,
}

impl TimeSeriesCell {
    /// Creates a new cell.
    #[must_use]
    pub const fn new(value: f64, ddate: NaiveDate, filed: NaiveDate) -> Self {
        Self {
            value,
            ddate,
            filed,
        }
    }

    /// Returns true if `candidate` should replace this cell.
    ///
    /// Only a strictly later filing replaces; ties keep the stored value.
    #[must_use]
    pub fn superseded_by(&self, candidate: &Self) -> bool {
        candidate.filed > self.filed
    }
}

/// Outcome of merging a cell into a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Upsert {
    /// The coordinate was empty and now holds the new cell.
    Inserted,
    /// The stored cell was filed earlier and has been overwritten.
    Replaced,
    /// The stored cell was filed on or after the new one and was kept.
    Retained,
}

/// Growth percentages of one company's measure at one observation date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrowthRow {
    /// Company key.
    pub cik: String,
    /// Company display name.
    pub name: String,
    /// Observation date of the current value.
    pub ddate: NaiveDate,
    /// Measure tag, e.g. `Assets`.
    pub measure: String,
    /// Growth against the previous quarter, in percent.
    pub qoq: Option<f64>,
    /// Growth against the same quarter one year earlier, in percent.
    pub yoy: Option<f64>,
    /// Growth against the same quarter three years earlier, in percent.
    pub three_year: Option<f64>,
    /// Growth against the same quarter five years earlier, in percent.
    pub five_year: Option<f64>,
}

impl GrowthRow {
    /// Returns the percentage for a lookback kind.
    #[must_use]
    pub const fn growth(&self, kind: LookbackKind) -> Option<f64> {
        match kind {
            LookbackKind::QuarterOverQuarter => self.qoq,
            LookbackKind::YearOverYear => self.yoy,
            LookbackKind::ThreeYear => self.three_year,
            LookbackKind::FiveYear => self.five_year,
        }
    }

    /// Returns the four percentages in output column order.
    #[must_use]
    pub const fn percentages(&self) -> [Option<f64>; 4] {
        [self.qoq, self.yoy, self.three_year, self.five_year]
    }

    /// Number of comparisons that resolved to a percentage.
    #[must_use]
    pub fn resolved(&self) -> usize {
        self.percentages().iter().filter(|p| p.is_some()).count()
    }
}

//! Submission index: `adsh` to filer metadata.

use growth_core::{Result, SubmissionMeta, sanitize_name};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, instrument, warn};

use crate::records::{Record, TsvRecords, parse_yyyymmdd};

/// Column of the accession number (submission id).
pub const ADSH: usize = 0;
/// Column of the filer's central index key.
pub const CIK: usize = 1;
/// Column of the filer's name.
pub const NAME: usize = 2;
/// Column of the filing date (`YYYYMMDD`).
pub const FILED: usize = 29;

/// Counters collected while building a [`SubmissionIndex`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Data records seen, excluding the header.
    pub records: usize,
    /// Records that made it into the index.
    pub indexed: usize,
    /// Records that could not be decoded or were missing required fields.
    pub unreadable: usize,
    /// Records whose submission id overwrote an earlier record.
    pub duplicates: usize,
}

/// Lookup from submission id to the filer's metadata.
///
/// Built from one `sub` file; later records with the same submission id
/// replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct SubmissionIndex {
    entries: HashMap<String, SubmissionMeta>,
    report: IndexReport,
}

impl SubmissionIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from a `sub` file's contents.
    ///
    /// The first record is the header and is skipped. Never fails: bad records
    /// are counted in [`report`](Self::report).
    pub fn from_reader<R: Read>(reader: R) -> Self {
        let mut index = Self::new();

        for record in TsvRecords::new(reader).skip(1) {
            index.report.records += 1;
            let parsed = match record {
                Record::Fields(fields) => parse_submission(&fields),
                Record::Unreadable => None,
            };
            match parsed {
                Some((adsh, meta)) => index.insert(adsh, meta),
                None => index.report.unreadable += 1,
            }
        }

        index
    }

    /// Builds an index from a `sub` file on disk.
    ///
    /// # Errors
    /// Returns [`GrowthError::Io`](growth_core::GrowthError::Io) if the file
    /// cannot be opened.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let index = Self::from_reader(BufReader::new(file));

        if index.report.unreadable > 0 {
            warn!(
                unreadable = index.report.unreadable,
                "Submission records could not be read"
            );
        }
        debug!(
            indexed = index.report.indexed,
            duplicates = index.report.duplicates,
            "Built submission index"
        );
        Ok(index)
    }

    /// Inserts or replaces the metadata for a submission id.
    pub fn insert(&mut self, adsh: impl Into<String>, meta: SubmissionMeta) {
        if self.entries.insert(adsh.into(), meta).is_some() {
            self.report.duplicates += 1;
        } else {
            self.report.indexed += 1;
        }
    }

    /// Looks up a submission id.
    #[must_use]
    pub fn get(&self, adsh: &str) -> Option<&SubmissionMeta> {
        self.entries.get(adsh)
    }

    /// Number of distinct submission ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index holds no submissions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counters collected while building the index.
    #[must_use]
    pub const fn report(&self) -> &IndexReport {
        &self.report
    }
}

fn parse_submission(fields: &csv::StringRecord) -> Option<(String, SubmissionMeta)> {
    let adsh = fields.get(ADSH)?.trim();
    let cik = fields.get(CIK)?.trim();
    let name = fields.get(NAME)?;
    let filed = parse_yyyymmdd(fields.get(FILED)?)?;

    if adsh.is_empty() || cik.is_empty() {
        return None;
    }

    Some((
        adsh.to_string(),
        SubmissionMeta {
            cik: cik.to_string(),
            name: sanitize_name(name.trim()),
            filed,
        },
    ))
}

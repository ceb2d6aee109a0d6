//! Time-series builder: merges `num` facts into a [`TimeSeriesStore`].

use chrono::NaiveDate;
use growth_core::{Coordinate, GrowthError, Result, TimeSeriesCell, TimeSeriesStore, Upsert};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use tracing::{debug, instrument, trace, warn};

use crate::pairs::FilePair;
use crate::records::{Record, TsvRecords, parse_yyyymmdd};
use crate::submissions::{IndexReport, SubmissionIndex};

/// Column of the accession number (submission id).
pub const ADSH: usize = 0;
/// Column of the measure tag.
pub const TAG: usize = 1;
/// Column of the co-registrant qualifier; empty for the filer's own values.
pub const COREG: usize = 3;
/// Column of the observation date (`YYYYMMDD`).
pub const DDATE: usize = 4;
/// Column of the duration in quarters; `0` for point-in-time values.
pub const QTRS: usize = 5;
/// Column of the unit of measure.
pub const UOM: usize = 6;
/// Column of the reported value.
pub const VALUE: usize = 7;

/// A fact row that passed the measure and qualifier filters.
#[derive(Debug, Clone, PartialEq)]
pub struct Fact {
    /// Submission id the fact was reported in.
    pub adsh: String,
    /// Measure tag.
    pub tag: String,
    /// Observation date.
    pub ddate: NaiveDate,
    /// Duration code, carried through unchanged.
    pub qtrs: String,
    /// Unit of measure, carried through unchanged.
    pub uom: String,
    /// Reported value.
    pub value: f64,
}

/// Counters collected while merging one fact stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Data records seen, excluding the header.
    pub records: usize,
    /// Records that could not be decoded or parsed.
    pub unreadable: usize,
    /// Records for other measures or with a non-empty qualifier.
    pub skipped: usize,
    /// Records dropped by the company filter.
    pub filtered: usize,
    /// Records whose submission id is missing from the index.
    pub unknown_submissions: usize,
    /// Merges that filled an empty coordinate.
    pub inserted: usize,
    /// Merges that replaced an earlier filing.
    pub replaced: usize,
    /// Merges that kept the stored cell.
    pub retained: usize,
}

impl MergeReport {
    /// Number of facts that reached the store.
    #[must_use]
    pub const fn merged(&self) -> usize {
        self.inserted + self.replaced + self.retained
    }

    /// Adds another report's counters to this one.
    pub const fn absorb(&mut self, other: &Self) {
        self.records += other.records;
        self.unreadable += other.unreadable;
        self.skipped += other.skipped;
        self.filtered += other.filtered;
        self.unknown_submissions += other.unknown_submissions;
        self.inserted += other.inserted;
        self.replaced += other.replaced;
        self.retained += other.retained;
    }

    const fn record(&mut self, outcome: Upsert) {
        match outcome {
            Upsert::Inserted => self.inserted += 1,
            Upsert::Replaced => self.replaced += 1,
            Upsert::Retained => self.retained += 1,
        }
    }
}

/// Diagnostics for one merged file pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairReport {
    /// Period identifier of the pair.
    pub period: String,
    /// Submission index counters.
    pub index: IndexReport,
    /// Fact merge counters.
    pub merge: MergeReport,
}

/// Outcome of classifying one fact row.
enum Parsed {
    Fact(Fact),
    Skipped,
    Unreadable,
}

/// Merges point-in-time facts of selected measures into a store.
///
/// Only rows with a tag in the measure set and an empty co-registrant
/// qualifier are considered. Duration (flow) measures are not aggregated.
#[derive(Debug, Clone)]
pub struct TimeSeriesBuilder {
    measures: HashSet<String>,
    companies: Option<HashSet<String>>,
}

impl TimeSeriesBuilder {
    /// Creates a builder for the given measure tags.
    ///
    /// # Errors
    /// Returns [`GrowthError::InvalidParameter`] if no measure is given.
    pub fn new<I, S>(measures: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let measures: HashSet<String> = measures.into_iter().map(Into::into).collect();
        if measures.is_empty() {
            return Err(GrowthError::InvalidParameter(
                "at least one measure tag is required".to_string(),
            ));
        }
        Ok(Self {
            measures,
            companies: None,
        })
    }

    /// Restricts merging to the given company keys.
    #[must_use]
    pub fn with_company_filter<I, S>(mut self, ciks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.companies = Some(ciks.into_iter().map(Into::into).collect());
        self
    }

    /// Returns true if `tag` is one of the measures of interest.
    #[must_use]
    pub fn wants(&self, tag: &str) -> bool {
        self.measures.contains(tag)
    }

    /// Merges a `num` file's contents into `store`.
    ///
    /// Data problems are counted in the returned report; only store failures
    /// produce an error. All upserts of one call form a single store batch.
    pub fn merge<R, S>(
        &self,
        facts: R,
        index: &SubmissionIndex,
        store: &mut S,
    ) -> Result<MergeReport>
    where
        R: Read,
        S: TimeSeriesStore + ?Sized,
    {
        store.begin_batch()?;
        let merged = self.merge_records(facts, index, store);
        // cells merged before a failure are kept, as they would be unbatched
        let ended = store.end_batch();
        let report = merged?;
        ended?;
        Ok(report)
    }

    fn merge_records<R, S>(
        &self,
        facts: R,
        index: &SubmissionIndex,
        store: &mut S,
    ) -> Result<MergeReport>
    where
        R: Read,
        S: TimeSeriesStore + ?Sized,
    {
        let mut report = MergeReport::default();

        for record in TsvRecords::new(facts).skip(1) {
            report.records += 1;

            let fact = match record {
                Record::Unreadable => Parsed::Unreadable,
                Record::Fields(fields) => self.parse_fact(&fields),
            };
            let fact = match fact {
                Parsed::Fact(fact) => fact,
                Parsed::Skipped => {
                    report.skipped += 1;
                    continue;
                }
                Parsed::Unreadable => {
                    report.unreadable += 1;
                    continue;
                }
            };

            let Some(meta) = index.get(&fact.adsh) else {
                trace!(adsh = %fact.adsh, tag = %fact.tag, "Unknown submission");
                report.unknown_submissions += 1;
                continue;
            };

            if let Some(companies) = &self.companies {
                if !companies.contains(&meta.cik) {
                    report.filtered += 1;
                    continue;
                }
            }

            let cell = TimeSeriesCell::new(fact.value, fact.ddate, meta.filed);
            let outcome = store.upsert(
                &meta.company(),
                &fact.tag,
                Coordinate::of_date(fact.ddate),
                cell,
            )?;
            report.record(outcome);
        }

        Ok(report)
    }

    /// Builds the submission index of a pair and merges its facts into `store`.
    ///
    /// # Errors
    /// Returns [`GrowthError::Io`] if either file cannot be opened, and store
    /// errors from the merge.
    #[instrument(skip_all, fields(period = %pair.period))]
    pub fn merge_pair<S>(&self, pair: &FilePair, store: &mut S) -> Result<PairReport>
    where
        S: TimeSeriesStore + ?Sized,
    {
        let index = SubmissionIndex::from_path(&pair.submissions)?;
        let facts = File::open(&pair.facts)?;
        let merge = self.merge(BufReader::new(facts), &index, store)?;

        if merge.unreadable > 0 {
            warn!(
                unreadable = merge.unreadable,
                file = %pair.facts.display(),
                "Fact records could not be read"
            );
        }
        debug!(
            records = merge.records,
            merged = merge.merged(),
            replaced = merge.replaced,
            unknown_submissions = merge.unknown_submissions,
            "Merged fact file"
        );

        Ok(PairReport {
            period: pair.period.to_string(),
            index: *index.report(),
            merge,
        })
    }

    fn parse_fact(&self, fields: &csv::StringRecord) -> Parsed {
        let (Some(tag), Some(coreg)) = (fields.get(TAG), fields.get(COREG)) else {
            return Parsed::Unreadable;
        };
        if !self.wants(tag) || !coreg.is_empty() {
            return Parsed::Skipped;
        }

        let (Some(adsh), Some(ddate), Some(qtrs), Some(uom), Some(value)) = (
            fields.get(ADSH),
            fields.get(DDATE),
            fields.get(QTRS),
            fields.get(UOM),
            fields.get(VALUE),
        ) else {
            return Parsed::Unreadable;
        };

        let Some(ddate) = parse_yyyymmdd(ddate) else {
            return Parsed::Unreadable;
        };
        let value = match value.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => return Parsed::Unreadable,
        };

        Parsed::Fact(Fact {
            adsh: adsh.to_string(),
            tag: tag.to_string(),
            ddate,
            qtrs: qtrs.to_string(),
            uom: uom.to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submissions::tests::{sub_header, sub_line};
    use growth_core::{Quarter, SubmissionMeta};
    use growth_store::InMemoryStore;

    const NUM_HEADER: &str = "adsh\ttag\tversion\tcoreg\tddate\tqtrs\tuom\tvalue\tfootnote";

    fn num_line(adsh: &str, tag: &str, coreg: &str, ddate: &str, value: &str) -> String {
        format!("{adsh}\t{tag}\tus-gaap/2019\t{coreg}\t{ddate}\t0\tUSD\t{value}\t")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn index_with(entries: &[(&str, &str, &str, NaiveDate)]) -> SubmissionIndex {
        let mut index = SubmissionIndex::new();
        for (adsh, cik, name, filed) in entries {
            index.insert(
                *adsh,
                SubmissionMeta {
                    cik: (*cik).to_string(),
                    name: (*name).to_string(),
                    filed: *filed,
                },
            );
        }
        index
    }

    fn assets_builder() -> TimeSeriesBuilder {
        TimeSeriesBuilder::new(["Assets"]).unwrap()
    }

    #[test]
    fn test_builder_requires_a_measure() {
        let err = TimeSeriesBuilder::new(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, GrowthError::InvalidParameter(_)));
    }

    #[test]
    fn test_merge_filters_measure_and_qualifier() {
        let index = index_with(&[("a1", "1", "Acme Inc", date(2019, 2, 15))]);
        let facts = [
            NUM_HEADER.to_string(),
            num_line("a1", "Assets", "", "20181231", "100"),
            num_line("a1", "Liabilities", "", "20181231", "40"),
            num_line("a1", "Assets", "SubsidiaryCo", "20181231", "70"),
        ]
        .join("\n");

        let mut store = InMemoryStore::new();
        let report = assets_builder()
            .merge(facts.as_bytes(), &index, &mut store)
            .unwrap();

        assert_eq!(report.records, 3);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.inserted, 1);
        let cell = store
            .cell("1", "Assets", Coordinate::new(2018, Quarter::Fourth))
            .unwrap()
            .unwrap();
        assert_eq!(cell.value, 100.0);
        assert_eq!(cell.filed, date(2019, 2, 15));
    }

    #[test]
    fn test_merge_later_filing_wins() {
        let index = index_with(&[
            ("early", "1", "Acme", date(2019, 1, 1)),
            ("late", "1", "Acme", date(2019, 3, 1)),
        ]);
        let forward = [
            NUM_HEADER.to_string(),
            num_line("early", "Assets", "", "20181231", "10"),
            num_line("late", "Assets", "", "20181231", "20"),
        ]
        .join("\n");
        let backward = [
            NUM_HEADER.to_string(),
            num_line("late", "Assets", "", "20181231", "20"),
            num_line("early", "Assets", "", "20181231", "10"),
        ]
        .join("\n");

        for facts in [forward, backward] {
            let mut store = InMemoryStore::new();
            assets_builder()
                .merge(facts.as_bytes(), &index, &mut store)
                .unwrap();
            let cell = store
                .cell("1", "Assets", Coordinate::new(2018, Quarter::Fourth))
                .unwrap()
                .unwrap();
            assert_eq!(cell.value, 20.0);
        }
    }

    #[test]
    fn test_merge_unknown_submission_is_counted() {
        let index = index_with(&[("a1", "1", "Acme", date(2019, 2, 15))]);
        let facts = [
            NUM_HEADER.to_string(),
            num_line("missing", "Assets", "", "20181231", "100"),
        ]
        .join("\n");

        let mut store = InMemoryStore::new();
        let report = assets_builder()
            .merge(facts.as_bytes(), &index, &mut store)
            .unwrap();

        assert_eq!(report.unknown_submissions, 1);
        assert_eq!(report.merged(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_merge_counts_unreadable_rows() {
        let index = index_with(&[("a1", "1", "Acme", date(2019, 2, 15))]);
        let mut facts = [
            NUM_HEADER.to_string(),
            num_line("a1", "Assets", "", "2018123", "100"),
            num_line("a1", "Assets", "", "20181231", "n/a"),
            num_line("a1", "Assets", "", "20181231", ""),
            "a1\tAssets".to_string(),
            num_line("a1", "Assets", "", "20190331", "5"),
        ]
        .join("\n")
        .into_bytes();
        facts.extend_from_slice(b"\na1\tAssets\t\xff\t\n");

        let mut store = InMemoryStore::new();
        let report = assets_builder()
            .merge(facts.as_slice(), &index, &mut store)
            .unwrap();

        assert_eq!(report.records, 6);
        assert_eq!(report.unreadable, 5);
        assert_eq!(report.inserted, 1);
    }

    #[test]
    fn test_merge_counts_blank_lines() {
        let index = index_with(&[("a1", "1", "Acme", date(2019, 2, 15))]);
        let facts = [
            NUM_HEADER.to_string(),
            String::new(),
            num_line("a1", "Assets", "", "20181231", "100"),
            String::new(),
            String::new(),
        ]
        .join("\n");

        let mut store = InMemoryStore::new();
        let report = assets_builder()
            .merge(facts.as_bytes(), &index, &mut store)
            .unwrap();

        assert_eq!(report.records, 3);
        assert_eq!(report.unreadable, 2);
        assert_eq!(report.inserted, 1);
    }

    #[test]
    fn test_merge_commits_sqlite_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.db");
        let index = index_with(&[("a1", "1", "Acme", date(2020, 2, 15))]);
        let facts = [
            NUM_HEADER.to_string(),
            num_line("a1", "Assets", "", "20181231", "100"),
            num_line("a1", "Assets", "", "20191231", "150"),
        ]
        .join("\n");

        let mut store = growth_store::SqliteStore::new(&path).unwrap();
        let report = assets_builder()
            .merge(facts.as_bytes(), &index, &mut store)
            .unwrap();
        assert_eq!(report.inserted, 2);

        // a second connection only sees committed cells
        let reader = growth_store::SqliteStore::new(&path).unwrap();
        assert_eq!(reader.cell_count().unwrap(), 2);
    }

    #[test]
    fn test_merge_accumulates_across_calls() {
        let first = index_with(&[("a1", "1", "Acme", date(2019, 2, 15))]);
        let second = index_with(&[("b1", "1", "Acme", date(2020, 2, 15))]);
        let mut store = InMemoryStore::new();
        let builder = assets_builder();

        let facts = format!("{NUM_HEADER}\n{}", num_line("a1", "Assets", "", "20181231", "1"));
        builder.merge(facts.as_bytes(), &first, &mut store).unwrap();
        let facts = format!("{NUM_HEADER}\n{}", num_line("b1", "Assets", "", "20191231", "2"));
        builder.merge(facts.as_bytes(), &second, &mut store).unwrap();

        assert_eq!(store.series("1", "Assets").len(), 2);
    }

    #[test]
    fn test_company_filter() {
        let index = index_with(&[
            ("a1", "1", "Acme", date(2019, 2, 15)),
            ("a2", "2", "Other", date(2019, 2, 15)),
        ]);
        let facts = [
            NUM_HEADER.to_string(),
            num_line("a1", "Assets", "", "20181231", "1"),
            num_line("a2", "Assets", "", "20181231", "2"),
        ]
        .join("\n");

        let mut store = InMemoryStore::new();
        let report = assets_builder()
            .with_company_filter(["2"])
            .merge(facts.as_bytes(), &index, &mut store)
            .unwrap();

        assert_eq!(report.filtered, 1);
        let keys: Vec<String> = store
            .companies()
            .unwrap()
            .into_iter()
            .map(|c| c.cik)
            .collect();
        assert_eq!(keys, ["2"]);
    }

    #[test]
    fn test_merge_pair_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let pair = FilePair::legacy(dir.path(), "19q1".parse().unwrap());
        std::fs::write(
            &pair.submissions,
            [sub_header(), sub_line("a1", "1", "Acme, Inc", "20190215")].join("\n"),
        )
        .unwrap();
        std::fs::write(
            &pair.facts,
            [NUM_HEADER.to_string(), num_line("a1", "Assets", "", "20181231", "100")].join("\n"),
        )
        .unwrap();

        let mut store = InMemoryStore::new();
        let report = assets_builder().merge_pair(&pair, &mut store).unwrap();
        assert_eq!(report.period, "2019q1");
        assert_eq!(report.index.indexed, 1);
        assert_eq!(report.merge.inserted, 1);
        assert_eq!(store.company("1").unwrap().name, "Acme Inc");
    }

    #[test]
    fn test_merge_pair_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let pair = FilePair::legacy(dir.path(), "19q1".parse().unwrap());
        let mut store = InMemoryStore::new();
        let err = assets_builder().merge_pair(&pair, &mut store).unwrap_err();
        assert!(matches!(err, GrowthError::Io(_)));
    }
}

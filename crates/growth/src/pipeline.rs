//! Run driver: merge every configured period, then compute and write growth.

use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use growth_core::{GrowthCalculator, GrowthError, GrowthRow, Result, TimeSeriesStore};
use growth_edgar::{FilePair, MergeReport, PairReport, Period, TimeSeriesBuilder};
use growth_store::InMemoryStore;

use crate::config::{OutputFormat, PipelineConfig, StoreConfig};
use crate::export;

/// Diagnostics of the merge phase.
#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    /// One report per merged file pair, in merge order.
    pub pairs: Vec<PairReport>,
    /// Periods whose files were missing or unreadable.
    pub missing: Vec<Period>,
    /// Merge counters summed over all pairs.
    pub merge: MergeReport,
    /// Wall time of the merge phase.
    pub elapsed: Duration,
}

/// Diagnostics of a full run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Merge phase diagnostics.
    pub build: BuildSummary,
    /// Rows written per measure, in configured order.
    pub rows: Vec<(String, usize)>,
    /// Wall time of growth computation and output.
    pub write_elapsed: Duration,
}

impl RunSummary {
    /// Total number of rows written.
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows.iter().map(|(_, n)| n).sum()
    }
}

/// Runs the merge and growth phases for one [`PipelineConfig`].
///
/// # Example
///
/// ```rust,ignore
/// use growth::{Pipeline, PipelineConfig};
///
/// let config = PipelineConfig {
///     data_dir: "data".into(),
///     periods: vec!["18q4".into(), "19q1".into()],
///     ..Default::default()
/// };
/// let summary = Pipeline::new(config)?.run()?;
/// println!("{} rows", summary.rows_written());
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    periods: Vec<Period>,
    calculators: Vec<GrowthCalculator>,
}

impl Pipeline {
    /// Validates `config` and prepares one calculator per measure.
    ///
    /// # Errors
    /// Returns the validation error of [`PipelineConfig::validate`].
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let periods = config.validate()?;
        let calculators = config
            .measures
            .iter()
            .map(|m| GrowthCalculator::new(m.as_str(), config.begin_year, config.end_year))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config,
            periods,
            calculators,
        })
    }

    /// The configuration this pipeline runs.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Opens the configured store.
    ///
    /// # Errors
    /// Returns store errors, or [`GrowthError::Config`] if SQLite is requested
    /// without the `sqlite` feature.
    pub fn open_store(&self) -> Result<Box<dyn TimeSeriesStore>> {
        match &self.config.store {
            StoreConfig::Memory => Ok(Box::new(InMemoryStore::new())),
            #[cfg(feature = "sqlite")]
            StoreConfig::Sqlite { path } => {
                Ok(Box::new(growth_store::SqliteStore::new(path)?))
            }
            #[cfg(not(feature = "sqlite"))]
            StoreConfig::Sqlite { .. } => Err(GrowthError::Config(
                "SQLite store requested but the sqlite feature is disabled".to_string(),
            )),
        }
    }

    /// Merges every configured period into `store`.
    ///
    /// A pair whose files cannot be opened is logged, recorded in
    /// [`BuildSummary::missing`] and skipped.
    ///
    /// # Errors
    /// Returns store errors; these abort the merge.
    #[instrument(skip_all, fields(periods = self.periods.len()))]
    pub fn build<S>(&self, store: &mut S) -> Result<BuildSummary>
    where
        S: TimeSeriesStore + ?Sized,
    {
        let started = Instant::now();
        let mut builder = TimeSeriesBuilder::new(self.config.measures.iter().cloned())?;
        if let Some(companies) = &self.config.companies {
            builder = builder.with_company_filter(companies.iter().cloned());
        }

        let mut summary = BuildSummary::default();
        for &period in &self.periods {
            let pair = FilePair::resolve(&self.config.data_dir, period);
            match builder.merge_pair(&pair, store) {
                Ok(report) => {
                    summary.merge.absorb(&report.merge);
                    summary.pairs.push(report);
                }
                Err(GrowthError::Io(e)) => {
                    warn!(
                        %period,
                        facts = %pair.facts.display(),
                        error = %e,
                        "Skipping unavailable file pair"
                    );
                    summary.missing.push(period);
                }
                Err(e) => return Err(e),
            }
        }
        summary.elapsed = started.elapsed();

        info!(
            pairs = summary.pairs.len(),
            missing = summary.missing.len(),
            merged = summary.merge.merged(),
            unreadable = summary.merge.unreadable,
            cells = store.cell_count()?,
            elapsed = ?summary.elapsed,
            "Time series built"
        );
        Ok(summary)
    }

    /// Computes growth rows for every measure, measures in configured order.
    ///
    /// # Errors
    /// Returns store read errors.
    pub fn growth_rows<S>(&self, store: &S) -> Result<Vec<GrowthRow>>
    where
        S: TimeSeriesStore + ?Sized,
    {
        let mut rows = Vec::new();
        for calculator in &self.calculators {
            let computed = calculator.compute(store)?;
            debug!(measure = calculator.measure(), rows = computed.len(), "Computed growth");
            rows.extend(computed);
        }
        Ok(rows)
    }

    /// Computes growth from `store` and writes it to the configured output.
    ///
    /// # Errors
    /// Returns store read errors and output errors.
    #[instrument(skip_all, fields(output = %self.config.output.display()))]
    pub fn write<S>(&self, store: &S) -> Result<Vec<(String, usize)>>
    where
        S: TimeSeriesStore + ?Sized,
    {
        let rows = self.growth_rows(store)?;
        let counts = self
            .calculators
            .iter()
            .map(|c| {
                let n = rows.iter().filter(|r| r.measure == c.measure()).count();
                (c.measure().to_string(), n)
            })
            .collect();

        write_rows(&self.config.output, self.config.format, &rows)?;
        Ok(counts)
    }

    /// Opens the configured store, merges all periods and writes growth.
    ///
    /// # Errors
    /// Returns store and output errors. Missing input pairs are not errors.
    pub fn run(&self) -> Result<RunSummary> {
        let mut store = self.open_store()?;
        let build = self.build(&mut *store)?;

        let started = Instant::now();
        let rows = self.write(&*store)?;
        let write_elapsed = started.elapsed();
        info!(
            rows = rows.iter().map(|(_, n)| n).sum::<usize>(),
            elapsed = ?write_elapsed,
            "Growth written"
        );

        Ok(RunSummary {
            build,
            rows,
            write_elapsed,
        })
    }
}

/// Writes rows in `format`: CSV appends, Parquet replaces.
///
/// # Errors
/// Returns I/O and export errors.
pub fn write_rows(path: &Path, format: OutputFormat, rows: &[GrowthRow]) -> Result<usize> {
    match format {
        OutputFormat::Csv => export::append_csv(path, rows),
        OutputFormat::Parquet => export::write_parquet(path, rows),
    }
}

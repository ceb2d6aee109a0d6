//! CLI for computing growth percentages from SEC financial statement data sets.
//!
//! `growth run` merges the configured quarterly `num`/`sub` pairs and appends
//! growth rows to the output file. `growth inspect` reports what a single pair
//! contributes, and `growth periods` lists period ids for a range of years.

use clap::{Parser, Subcommand, ValueEnum};
use growth::{
    FilePair, GrowthError, InMemoryStore, OutputFormat, Pipeline, PipelineConfig, StoreConfig,
    TimeSeriesBuilder, TimeSeriesStore, periods,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "growth=info,growth_core=info,growth_edgar=info,growth_store=info";
const VERBOSE_FILTER: &str =
    "growth=debug,growth_core=debug,growth_edgar=debug,growth_store=debug";

#[derive(Parser)]
#[command(name = "growth")]
#[command(about = "Quarterly growth of SEC balance sheet measures", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge data set periods and write growth rows
    Run(RunArgs),
    /// Print data set period ids for a range of years
    Periods {
        /// First release year
        first: i32,
        /// Last release year
        last: i32,
        /// Print four-digit ids (2019q1) instead of file ids (19q1)
        #[arg(long)]
        long: bool,
    },
    /// Merge one num/sub pair and print its diagnostics
    Inspect {
        /// Path of a flat fact file such as num19q1.txt
        facts: PathBuf,
        /// Measure tags to keep
        #[arg(short, long = "measure", default_value = "Assets")]
        measures: Vec<String>,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// JSON configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory holding the data set files
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Measure tag (repeatable)
    #[arg(short, long = "measure")]
    measures: Vec<String>,
    /// Data set period id, e.g. 19q1 (repeatable)
    #[arg(short, long = "period")]
    periods: Vec<String>,
    /// First observation year to output
    #[arg(long)]
    begin: Option<i32>,
    /// Last observation year to output
    #[arg(long)]
    end: Option<i32>,
    /// Output file
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum)]
    format: Option<Format>,
    /// Keep the time series in this SQLite file instead of memory
    #[arg(long)]
    sqlite: Option<PathBuf>,
    /// Only merge these company keys (repeatable)
    #[arg(long = "company")]
    companies: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Parquet,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => Self::Csv,
            Format::Parquet => Self::Parquet,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => run(args),
        Commands::Periods { first, last, long } => {
            list_periods(first, last, long);
            Ok(())
        }
        Commands::Inspect { facts, measures } => inspect(&facts, measures),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "growth failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the run configuration: file (or defaults) first, then flags.
fn load_config(args: RunArgs) -> growth::Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if !args.measures.is_empty() {
        config.measures = args.measures;
    }
    if !args.periods.is_empty() {
        config.periods = args.periods;
    }
    if let Some(begin) = args.begin {
        config.begin_year = begin;
    }
    if let Some(end) = args.end {
        config.end_year = end;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(format) = args.format {
        config.format = format.into();
    }
    if let Some(path) = args.sqlite {
        config.store = StoreConfig::Sqlite { path };
    }
    if !args.companies.is_empty() {
        config.companies = Some(args.companies);
    }
    Ok(config)
}

fn run(args: RunArgs) -> growth::Result<()> {
    let config = load_config(args)?;
    let pipeline = Pipeline::new(config)?;
    let summary = pipeline.run()?;

    for report in &summary.build.pairs {
        println!(
            "{}: {} facts merged ({} replaced, {} retained), {} unreadable, {} unknown submissions",
            report.period,
            report.merge.merged(),
            report.merge.replaced,
            report.merge.retained,
            report.merge.unreadable + report.index.unreadable,
            report.merge.unknown_submissions,
        );
    }
    for period in &summary.build.missing {
        println!("{period}: missing");
    }
    for (measure, rows) in &summary.rows {
        println!("{measure}: {rows} rows");
    }

    info!(
        build = ?summary.build.elapsed,
        write = ?summary.write_elapsed,
        output = %pipeline.config().output.display(),
        "Done"
    );
    Ok(())
}

fn list_periods(first: i32, last: i32, long: bool) {
    for period in periods(first, last) {
        if long {
            println!("{period}");
        } else {
            println!("{}", period.short_id());
        }
    }
}

fn inspect(facts: &Path, measures: Vec<String>) -> growth::Result<()> {
    let pair = FilePair::from_fact_file(facts)?;
    if !pair.exists() {
        return Err(GrowthError::Config(format!(
            "expected {} next to {}",
            pair.submissions.display(),
            pair.facts.display()
        )));
    }

    let builder = TimeSeriesBuilder::new(measures)?;
    let mut store = InMemoryStore::new();
    let report = builder.merge_pair(&pair, &mut store)?;

    println!("Period: {}", report.period);
    println!("Submissions:");
    println!("  records:    {}", report.index.records);
    println!("  indexed:    {}", report.index.indexed);
    println!("  duplicates: {}", report.index.duplicates);
    println!("  unreadable: {}", report.index.unreadable);
    println!("Facts:");
    println!("  records:             {}", report.merge.records);
    println!("  skipped:             {}", report.merge.skipped);
    println!("  unreadable:          {}", report.merge.unreadable);
    println!("  unknown submissions: {}", report.merge.unknown_submissions);
    println!("  merged:              {}", report.merge.merged());
    println!("Time series:");
    println!("  companies: {}", store.len());
    println!("  cells:     {}", store.cell_count()?);
    Ok(())
}

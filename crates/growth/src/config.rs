//! Run configuration.

use growth_core::{GrowthError, Result};
use growth_edgar::{Period, periods};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File format of the growth output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Append-only comma-separated values.
    #[default]
    Csv,
    /// Apache Parquet; the file is replaced on every run.
    Parquet,
}

/// Backend holding the time series during a run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum StoreConfig {
    /// Hash maps, discarded at the end of the run.
    #[default]
    Memory,
    /// SQLite database file, kept between runs.
    Sqlite {
        /// Path of the database file.
        path: PathBuf,
    },
}

/// Everything a [`Pipeline`](crate::Pipeline) run needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the data set files.
    pub data_dir: PathBuf,
    /// Measure tags to compute growth for, in output order.
    pub measures: Vec<String>,
    /// First observation year written to the output.
    pub begin_year: i32,
    /// Last observation year written to the output.
    pub end_year: i32,
    /// Data set period ids to merge, e.g. `19q1` or `2019q1`, in merge order.
    pub periods: Vec<String>,
    /// Output file path.
    pub output: PathBuf,
    /// Output file format.
    pub format: OutputFormat,
    /// Only merge facts of these company keys.
    pub companies: Option<Vec<String>>,
    /// Time-series backend.
    pub store: StoreConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            measures: vec!["Assets".to_string()],
            begin_year: 2010,
            end_year: 2019,
            periods: periods(2010, 2019).iter().map(Period::short_id).collect(),
            output: PathBuf::from("percentage_growth.csv"),
            format: OutputFormat::Csv,
            companies: None,
            store: StoreConfig::Memory,
        }
    }
}

impl PipelineConfig {
    /// Loads a configuration from a JSON file. Missing keys take their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| GrowthError::Config(format!("{}: {e}", path.display())))
    }

    /// Checks the configuration and returns the parsed periods.
    ///
    /// # Errors
    /// Returns [`GrowthError::Config`] for empty or repeated measures or an
    /// empty period list, and
    /// [`GrowthError::InvalidParameter`] for an inverted year range or a
    /// malformed period id.
    pub fn validate(&self) -> Result<Vec<Period>> {
        if self.measures.is_empty() || self.measures.iter().any(|m| m.trim().is_empty()) {
            return Err(GrowthError::Config(
                "measures must list at least one non-empty tag".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = self.measures.iter().find(|m| !seen.insert(m.as_str())) {
            return Err(GrowthError::Config(format!("measure '{dup}' is listed twice")));
        }
        if self.begin_year > self.end_year {
            return Err(GrowthError::InvalidParameter(format!(
                "begin year {} is after end year {}",
                self.begin_year, self.end_year
            )));
        }
        if self.periods.is_empty() {
            return Err(GrowthError::Config("no data set periods configured".to_string()));
        }
        self.periods.iter().map(|p| p.parse()).collect()
    }
}

//! Locating one period's `num`/`sub` file pair.

use growth_core::{GrowthError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A data set period: the calendar quarter in which the SEC published the files.
///
/// This is the release quarter of the archive (1-4), unrelated to the
/// canonical quarter of the facts inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    /// Four-digit release year.
    pub year: i32,
    /// Release quarter, 1-4.
    pub quarter: u8,
}

impl Period {
    /// Creates a period.
    ///
    /// # Errors
    /// Returns [`GrowthError::InvalidParameter`] if `quarter` is not in 1-4.
    pub fn new(year: i32, quarter: u8) -> Result<Self> {
        if !(1..=4).contains(&quarter) {
            return Err(GrowthError::InvalidParameter(format!(
                "data set quarter {quarter} is outside 1..=4"
            )));
        }
        Ok(Self { year, quarter })
    }

    /// Two-digit form used by flat file names, e.g. `19q1`.
    #[must_use]
    pub fn short_id(&self) -> String {
        format!("{:02}q{}", self.year.rem_euclid(100), self.quarter)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}q{}", self.year, self.quarter)
    }
}

impl FromStr for Period {
    type Err = GrowthError;

    /// Parses `2019q1` or the two-digit `19q1` (taken as 2000 + yy).
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || GrowthError::InvalidParameter(format!("invalid period id '{s}'"));
        let digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());

        let (year, quarter) = s.split_once(['q', 'Q']).ok_or_else(invalid)?;
        if !digits(year) || !digits(quarter) {
            return Err(invalid());
        }

        let value: i32 = year.parse().map_err(|_| invalid())?;
        let year = match year.len() {
            2 => 2000 + value,
            4 => value,
            _ => return Err(invalid()),
        };
        let quarter: u8 = quarter.parse().map_err(|_| invalid())?;
        Self::new(year, quarter)
    }
}

/// Every period of the years `first..=last`, in release order.
#[must_use]
pub fn periods(first: i32, last: i32) -> Vec<Period> {
    (first..=last)
        .flat_map(|year| (1..=4).map(move |quarter| Period { year, quarter }))
        .collect()
}

/// The `num` (facts) and `sub` (submissions) files of one period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePair {
    /// Period the files belong to.
    pub period: Period,
    /// Path of the fact file.
    pub facts: PathBuf,
    /// Path of the submission file.
    pub submissions: PathBuf,
}

impl FilePair {
    /// Flat layout: `dir/num19q1.txt` and `dir/sub19q1.txt`.
    #[must_use]
    pub fn legacy(dir: impl AsRef<Path>, period: Period) -> Self {
        let dir = dir.as_ref();
        let id = period.short_id();
        Self {
            period,
            facts: dir.join(format!("num{id}.txt")),
            submissions: dir.join(format!("sub{id}.txt")),
        }
    }

    /// SEC archive layout: `dir/2019q1/num.txt` and `dir/2019q1/sub.txt`.
    #[must_use]
    pub fn archive(dir: impl AsRef<Path>, period: Period) -> Self {
        let dir = dir.as_ref().join(period.to_string());
        Self {
            period,
            facts: dir.join("num.txt"),
            submissions: dir.join("sub.txt"),
        }
    }

    /// Picks the archive layout if its directory exists, the flat layout otherwise.
    #[must_use]
    pub fn resolve(dir: impl AsRef<Path>, period: Period) -> Self {
        let dir = dir.as_ref();
        if dir.join(period.to_string()).is_dir() {
            Self::archive(dir, period)
        } else {
            Self::legacy(dir, period)
        }
    }

    /// Derives the pair from a flat fact file name such as `num19q1.txt`.
    ///
    /// # Errors
    /// Returns [`GrowthError::InvalidParameter`] if the name does not follow
    /// the `num<period>.txt` pattern.
    pub fn from_fact_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let invalid = || {
            GrowthError::InvalidParameter(format!(
                "'{}' is not a num<period>.txt file",
                path.display()
            ))
        };
        let name = path.file_name().and_then(|n| n.to_str()).ok_or_else(invalid)?;
        let rest = name.strip_prefix("num").ok_or_else(invalid)?;
        let id = rest.strip_suffix(".txt").unwrap_or(rest);
        let period: Period = id.parse().map_err(|_| invalid())?;

        Ok(Self {
            period,
            facts: path.to_path_buf(),
            submissions: path.with_file_name(format!("sub{rest}")),
        })
    }

    /// Returns true if both files exist.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.facts.is_file() && self.submissions.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("19q1", 2019, 1)]
    #[case("10q4", 2010, 4)]
    #[case("2009q2", 2009, 2)]
    #[case("2024Q3", 2024, 3)]
    fn test_period_parse(#[case] input: &str, #[case] year: i32, #[case] quarter: u8) {
        assert_eq!(input.parse::<Period>().unwrap(), Period { year, quarter });
    }

    #[rstest]
    #[case("19q5")]
    #[case("19q0")]
    #[case("2019")]
    #[case("q1")]
    #[case("201q1")]
    #[case("19qx")]
    fn test_period_parse_rejects(#[case] input: &str) {
        assert!(matches!(
            input.parse::<Period>(),
            Err(GrowthError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_periods_range() {
        let all = periods(2010, 2011);
        assert_eq!(all.len(), 8);
        assert_eq!(all[0].to_string(), "2010q1");
        assert_eq!(all[7].short_id(), "11q4");
        assert!(periods(2012, 2011).is_empty());
    }

    #[test]
    fn test_legacy_and_archive_paths() {
        let period: Period = "2010q1".parse().unwrap();
        let legacy = FilePair::legacy("data", period);
        assert_eq!(legacy.facts, Path::new("data/num10q1.txt"));
        assert_eq!(legacy.submissions, Path::new("data/sub10q1.txt"));

        let archive = FilePair::archive("data", period);
        assert_eq!(archive.facts, Path::new("data/2010q1/num.txt"));
        assert_eq!(archive.submissions, Path::new("data/2010q1/sub.txt"));
    }

    #[test]
    fn test_resolve_prefers_existing_archive_dir() {
        let dir = tempfile::tempdir().unwrap();
        let period: Period = "2019q2".parse().unwrap();
        assert_eq!(FilePair::resolve(dir.path(), period), FilePair::legacy(dir.path(), period));

        std::fs::create_dir(dir.path().join("2019q2")).unwrap();
        let pair = FilePair::resolve(dir.path(), period);
        assert_eq!(pair, FilePair::archive(dir.path(), period));
        assert!(!pair.exists());
    }

    #[test]
    fn test_from_fact_file() {
        let pair = FilePair::from_fact_file("in/num18q3.txt").unwrap();
        assert_eq!(pair.period, Period { year: 2018, quarter: 3 });
        assert_eq!(pair.submissions, Path::new("in/sub18q3.txt"));

        assert!(FilePair::from_fact_file("in/sub18q3.txt").is_err());
        assert!(FilePair::from_fact_file("in/num.txt").is_err());
    }
}

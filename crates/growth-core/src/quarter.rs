//! Canonical quarter coordinates and lookback offsets.
//!
//! Every observation date is placed on a (year, quarter) grid using only its
//! calendar month. This is an internal coordinate system: a company whose
//! fiscal year ends in June still has its June balance sheet placed in
//! quarter index 1.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{GrowthError, Result};

/// One of the four canonical calendar quarters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quarter {
    /// January through March (index 0).
    First,
    /// April through June (index 1).
    Second,
    /// July through September (index 2).
    Third,
    /// October through December (index 3).
    Fourth,
}

impl Quarter {
    /// All quarters in index order.
    pub const ALL: [Self; 4] = [Self::First, Self::Second, Self::Third, Self::Fourth];

    /// Maps a calendar month (1-12) to its quarter.
    ///
    /// Months outside 1-12 cannot come from a valid date: `0` maps to the
    /// first quarter and anything above 12 to the fourth.
    #[must_use]
    pub const fn from_month(month: u32) -> Self {
        match month {
            0..=3 => Self::First,
            4..=6 => Self::Second,
            7..=9 => Self::Third,
            _ => Self::Fourth,
        }
    }

    /// Returns the quarter index in `0..=3`.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::First => 0,
            Self::Second => 1,
            Self::Third => 2,
            Self::Fourth => 3,
        }
    }

    /// Returns the previous quarter and whether the step crossed into the prior year.
    #[must_use]
    pub const fn previous(self) -> (Self, bool) {
        match self {
            Self::First => (Self::Fourth, true),
            Self::Second => (Self::First, false),
            Self::Third => (Self::Second, false),
            Self::Fourth => (Self::Third, false),
        }
    }
}

impl TryFrom<u8> for Quarter {
    type Error = GrowthError;

    fn try_from(index: u8) -> Result<Self> {
        match index {
            0 => Ok(Self::First),
            1 => Ok(Self::Second),
            2 => Ok(Self::Third),
            3 => Ok(Self::Fourth),
            other => Err(GrowthError::InvalidParameter(format!(
                "quarter index {other} is outside 0..=3"
            ))),
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.index())
    }
}

/// Maps a date to its canonical quarter. Only the month is consulted.
#[must_use]
pub fn quarter_of(date: NaiveDate) -> Quarter {
    Quarter::from_month(date.month())
}

/// A position on the canonical (year, quarter) grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    /// Calendar year of the observation date.
    pub year: i32,
    /// Canonical quarter of the observation date.
    pub quarter: Quarter,
}

impl Coordinate {
    /// Creates a coordinate from a year and quarter.
    #[must_use]
    pub const fn new(year: i32, quarter: Quarter) -> Self {
        Self { year, quarter }
    }

    /// Places an observation date on the grid.
    #[must_use]
    pub fn of_date(date: NaiveDate) -> Self {
        Self::new(date.year(), quarter_of(date))
    }

    /// Returns the coordinate that `kind` compares this one against.
    #[must_use]
    pub const fn offset(self, kind: LookbackKind) -> Self {
        match kind {
            LookbackKind::QuarterOverQuarter => {
                let (quarter, wrapped) = self.quarter.previous();
                let year = if wrapped { self.year - 1 } else { self.year };
                Self::new(year, quarter)
            }
            LookbackKind::YearOverYear => Self::new(self.year - 1, self.quarter),
            LookbackKind::ThreeYear => Self::new(self.year - 3, self.quarter),
            LookbackKind::FiveYear => Self::new(self.year - 5, self.quarter),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.year, self.quarter)
    }
}

/// The comparison horizons a growth row is computed against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookbackKind {
    /// The immediately preceding quarter.
    QuarterOverQuarter,
    /// The same quarter one year earlier.
    YearOverYear,
    /// The same quarter three years earlier.
    ThreeYear,
    /// The same quarter five years earlier.
    FiveYear,
}

impl LookbackKind {
    /// All lookback kinds in output column order.
    pub const ALL: [Self; 4] = [
        Self::QuarterOverQuarter,
        Self::YearOverYear,
        Self::ThreeYear,
        Self::FiveYear,
    ];

    /// Short code used in configuration and logs.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::QuarterOverQuarter => "q",
            Self::YearOverYear => "y",
            Self::ThreeYear => "3y",
            Self::FiveYear => "5y",
        }
    }
}

impl FromStr for LookbackKind {
    type Err = GrowthError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "q" => Ok(Self::QuarterOverQuarter),
            "y" => Ok(Self::YearOverYear),
            "3y" => Ok(Self::ThreeYear),
            "5y" => Ok(Self::FiveYear),
            other => Err(GrowthError::InvalidParameter(format!(
                "unknown lookback kind '{other}', expected one of q, y, 3y, 5y"
            ))),
        }
    }
}

impl fmt::Display for LookbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Index-based form of [`Coordinate::offset`].
///
/// Returns `(quarter_index, year)` of the comparison cell. Fails fast with
/// [`GrowthError::InvalidParameter`] on a quarter index outside `0..=3` or an
/// unknown lookback code.
pub fn offset_coordinate(quarter: u8, year: i32, kind: &str) -> Result<(u8, i32)> {
    let kind = kind.parse::<LookbackKind>()?;
    let offset = Coordinate::new(year, Quarter::try_from(quarter)?).offset(kind);
    Ok((offset.quarter.index(), offset.year))
}

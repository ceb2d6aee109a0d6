//! Growth percentages over a [`TimeSeriesStore`].

use crate::{
    error::{GrowthError, Result},
    quarter::{Coordinate, LookbackKind, Quarter},
    store::TimeSeriesStore,
    types::{CompanyRecord, GrowthRow},
};

/// Percentage change from `past` to `current`, rounded to two decimals.
///
/// Returns `None` when `past` is exactly zero: a zero base carries no growth
/// signal. The exact binary value is rounded, with ties going to the even
/// digit, so `0.125` becomes `0.12`.
#[must_use]
pub fn growth_pct(current: f64, past: f64) -> Option<f64> {
    if past == 0.0 {
        return None;
    }
    let pct = (current - past) / past * 100.0;
    format!("{pct:.2}").parse().ok()
}

/// Computes growth rows for one measure over an inclusive year range.
///
/// Rows are produced with quarter (0 to 3) as the outer loop, then year
/// ascending, then companies in the store's first-observed order. A row is
/// emitted only if at least one of its four comparisons resolves.
#[derive(Debug, Clone)]
pub struct GrowthCalculator {
    measure: String,
    begin_year: i32,
    end_year: i32,
}

impl GrowthCalculator {
    /// Creates a calculator for `measure` over `begin_year..=end_year`.
    ///
    /// # Errors
    /// Returns [`GrowthError::InvalidParameter`] if the range is empty or the
    /// measure is blank.
    pub fn new(measure: impl Into<String>, begin_year: i32, end_year: i32) -> Result<Self> {
        let measure = measure.into();
        if measure.trim().is_empty() {
            return Err(GrowthError::InvalidParameter(
                "measure tag must not be empty".to_string(),
            ));
        }
        if begin_year > end_year {
            return Err(GrowthError::InvalidParameter(format!(
                "begin year {begin_year} is after end year {end_year}"
            )));
        }
        Ok(Self {
            measure,
            begin_year,
            end_year,
        })
    }

    /// The measure this calculator reads.
    #[must_use]
    pub fn measure(&self) -> &str {
        &self.measure
    }

    /// Walks the store and returns every row with at least one resolved comparison.
    pub fn compute<S: TimeSeriesStore + ?Sized>(&self, store: &S) -> Result<Vec<GrowthRow>> {
        let companies = store.companies()?;
        let mut rows = Vec::new();

        for quarter in Quarter::ALL {
            for year in self.begin_year..=self.end_year {
                let coordinate = Coordinate::new(year, quarter);
                for company in &companies {
                    if let Some(row) = self.row_at(store, company, coordinate)? {
                        rows.push(row);
                    }
                }
            }
        }

        Ok(rows)
    }

    /// Builds the row for one company at one coordinate, if it has any signal.
    pub fn row_at<S: TimeSeriesStore + ?Sized>(
        &self,
        store: &S,
        company: &CompanyRecord,
        coordinate: Coordinate,
    ) -> Result<Option<GrowthRow>> {
        let Some(current) = store.cell(&company.cik, &self.measure, coordinate)? else {
            return Ok(None);
        };

        let mut pct = [None; 4];
        for (slot, kind) in pct.iter_mut().zip(LookbackKind::ALL) {
            let past = store.cell(&company.cik, &self.measure, coordinate.offset(kind))?;
            *slot = past.and_then(|past| growth_pct(current.value, past.value));
        }

        let absent = pct.iter().filter(|p| p.is_none()).count();
        if absent == pct.len() {
            return Ok(None);
        }

        let [qoq, yoy, three_year, five_year] = pct;
        Ok(Some(GrowthRow {
            cik: company.cik.clone(),
            name: company.name.clone(),
            ddate: current.ddate,
            measure: self.measure.clone(),
            qoq,
            yoy,
            three_year,
            five_year,
        }))
    }
}

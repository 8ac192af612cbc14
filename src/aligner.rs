//! Year-over-year keys.
//!
//! Links every day to the same fiscal week one and two years back. Rows inside
//! the first fiscal year have no earlier row to point at, so their keys are
//! synthesized from the row's own week code and tagged as such.

use chrono::{Days, NaiveDate};
use serde::{Serialize, Serializer};
use tracing::trace;

use crate::consts::{LAST_YEAR_OFFSET_DAYS, PRIOR_YEAR_OFFSET_DAYS};
use crate::dates::{day_id, serialize_day_date};
use crate::deriver::DayAttributes;
use crate::prelude::*;
use crate::sequencer::YearPartition;
use crate::types::{FiscalMonth, FiscalWeekCode};
use crate::{CalendarError, invariant};

/// A value looked up from an earlier row, or made up because no such row exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookback<T> {
    HasPriorYear(T),
    Synthesized(T),
}

impl<T> Lookback<T> {
    pub const fn value(&self) -> &T {
        match self {
            Self::HasPriorYear(value) | Self::Synthesized(value) => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::HasPriorYear(value) | Self::Synthesized(value) => value,
        }
    }

    pub const fn is_synthesized(&self) -> bool {
        matches!(self, Self::Synthesized(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookback<U> {
        match self {
            Self::HasPriorYear(value) => Lookback::HasPriorYear(f(value)),
            Self::Synthesized(value) => Lookback::Synthesized(f(value)),
        }
    }
}

impl<T: Serialize> Serialize for Lookback<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.value().serialize(serializer)
    }
}

/// Cross-year keys of one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearOverYear {
    pub time_day_id_pk_int: u32,
    pub last_year_equiv_day_fk: String,
    #[serde(serialize_with = "serialize_day_date")]
    pub last_year_equiv_day_date: NaiveDate,
    pub last_year_equiv_week_fk: Lookback<FiscalWeekCode>,
    pub last_year_fiscal_year: i32,
    pub last_year_fiscal_month_of_year: Lookback<FiscalMonth>,
    pub prior_year_from_last_year_equiv_day_fk: String,
    #[serde(serialize_with = "serialize_day_date")]
    pub prior_year_from_last_year_equiv_day_date: NaiveDate,
    pub prior_year_from_last_year_equiv_week_fk: Lookback<FiscalWeekCode>,
    pub time_fiscal_week_id_fk: FiscalWeekCode,
}

/// One row of the fiscal calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deref)]
pub struct FiscalDay {
    #[deref]
    #[serde(flatten)]
    attributes:     DayAttributes,
    #[serde(flatten)]
    year_over_year: YearOverYear,
}

impl FiscalDay {
    pub const fn attributes(&self) -> &DayAttributes {
        &self.attributes
    }

    pub const fn year_over_year(&self) -> &YearOverYear {
        &self.year_over_year
    }

    pub fn into_parts(self) -> (DayAttributes, YearOverYear) {
        (self.attributes, self.year_over_year)
    }
}

/// Adds year-over-year keys to a contiguous run of derived days that starts
/// on the first day of the first partition.
#[derive(Debug, Clone, Copy)]
pub struct YearOverYearAligner<'a> {
    years: &'a [YearPartition],
}

impl<'a> YearOverYearAligner<'a> {
    pub const fn new(years: &'a [YearPartition]) -> Self {
        Self { years }
    }

    /// # Errors
    /// Returns `CalendarError::Invariant` if a day key is not numeric or a
    /// lookback date falls outside the supported range.
    pub fn align(&self, days: Vec<DayAttributes>) -> Result<Vec<FiscalDay>, CalendarError> {
        let keys = (0..days.len())
            .map(|index| self.year_over_year(&days, index))
            .collect::<Result<Vec<_>, _>>()?;

        let synthesized = keys
            .iter()
            .filter(|key| key.last_year_equiv_week_fk.is_synthesized())
            .count();
        trace!(rows = days.len(), synthesized, "aligned year-over-year keys");

        Ok(days
            .into_iter()
            .zip(keys)
            .map(|(attributes, year_over_year)| FiscalDay {
                attributes,
                year_over_year,
            })
            .collect())
    }

    fn year_over_year(
        &self,
        days: &[DayAttributes],
        index: usize,
    ) -> Result<YearOverYear, CalendarError> {
        let day = days
            .get(index)
            .ok_or_else(|| invariant(format!("no derived day at row {index}")))?;
        let date = day.day_date;
        let last_year_date = days_back(date, LAST_YEAR_OFFSET_DAYS)?;
        let prior_year_date = days_back(date, PRIOR_YEAR_OFFSET_DAYS)?;

        let last_year = lookback_row(days, index, LAST_YEAR_OFFSET_DAYS);
        let prior_year = lookback_row(days, index, PRIOR_YEAR_OFFSET_DAYS);

        let last_year_equiv_week_fk = match last_year {
            Some(row) => Lookback::HasPriorYear(row.fiscal_week_iso_code),
            None => Lookback::Synthesized(day.fiscal_week_iso_code.previous_year(1)),
        };

        // two years back is last year's own lookback, so it stays synthesized
        // until a real row exists 728 days earlier
        let prior_year_from_last_year_equiv_week_fk = match (prior_year, last_year) {
            (Some(row), _) => Lookback::HasPriorYear(row.fiscal_week_iso_code),
            (None, Some(row)) => Lookback::Synthesized(row.fiscal_week_iso_code.previous_year(1)),
            (None, None) => Lookback::Synthesized(day.fiscal_week_iso_code.previous_year(2)),
        };

        let last_year_fiscal_month_of_year = match last_year {
            Some(row) => Lookback::HasPriorYear(row.fiscal_month_of_year),
            None => Lookback::Synthesized(self.replayed_month(index)?),
        };

        let time_day_id_pk_int = day
            .time_day_id_pk
            .parse::<u32>()
            .map_err(|_| invariant(format!("day key {} is not numeric", day.time_day_id_pk)))?;

        Ok(YearOverYear {
            time_day_id_pk_int,
            last_year_equiv_day_fk: day_id(last_year_date),
            last_year_equiv_day_date: last_year_date,
            last_year_equiv_week_fk,
            last_year_fiscal_year: day.fiscal_year - 1,
            last_year_fiscal_month_of_year,
            prior_year_from_last_year_equiv_day_fk: day_id(prior_year_date),
            prior_year_from_last_year_equiv_day_date: prior_year_date,
            prior_year_from_last_year_equiv_week_fk,
            time_fiscal_week_id_fk: day.fiscal_week_iso_code,
        })
    }

    /// Month of the first year's layout at the same offset.
    ///
    /// Months count from 1 at the first day of the fiscal year, matching
    /// `fiscal_month_of_year`, rather than from the anchor's calendar month.
    fn replayed_month(&self, index: usize) -> Result<FiscalMonth, CalendarError> {
        let first = self
            .years
            .first()
            .ok_or_else(|| invariant("no fiscal years to replay months from"))?;
        u16::try_from(index)
            .ok()
            .and_then(|offset| first.locate(offset))
            .map(|(month, _)| month)
            .ok_or_else(|| invariant(format!("row {index} is outside the first fiscal year")))
    }
}

fn lookback_row(days: &[DayAttributes], index: usize, offset: u16) -> Option<&DayAttributes> {
    index
        .checked_sub(usize::from(offset))
        .and_then(|earlier| days.get(earlier))
}

fn days_back(date: NaiveDate, days: u16) -> Result<NaiveDate, CalendarError> {
    date.checked_sub_days(Days::new(u64::from(days)))
        .ok_or_else(|| invariant(format!("{date} minus {days} days is out of range")))
}

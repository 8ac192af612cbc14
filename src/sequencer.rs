//! Fiscal year partitioning.
//!
//! A [`FiscalYearSequencer`] walks forward from the anchor date one fiscal year at
//! a time. Each year is split into 12 fiscal months of 4 or 5 weeks following the
//! 4-5-4 pattern. When the nominal 52-week year would end 4 or more days away
//! from January 31st, the last month is stretched to 5 weeks and the year
//! carries a 53rd week. The next year always starts where the previous one
//! ended, so years are resolved strictly in order.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::consts::{
    ANCHOR_MONTH_END_WINDOW, DAYS_PER_LONG_YEAR, DAYS_PER_WEEK, DAYS_PER_YEAR, LAST_FISCAL_MONTH,
    LONG_MONTH_WEEKS, LONG_YEAR_DRIFT_DAYS, MONTH_NAMES, MONTHS_PER_QUARTER, MONTHS_PER_YEAR,
    NOMINAL_YEAR_END_OFFSET, SHORT_MONTH_WEEKS, YEAR_END_REFERENCE_DAY, YEAR_END_REFERENCE_MONTH,
};
use crate::dates::days_in_month;
use crate::types::{FiscalMonth, FiscalQuarter};
use crate::{CalendarError, DateRange, invariant};

/// Shift applied to the month-name cycle for a given anchor date.
///
/// Returns -1 when the anchor falls within the last 5 days of its calendar month
/// (e.g. January 31st), meaning the following calendar month is fiscal month 1.
/// Returns 0 otherwise.
pub fn month_label_offset(anchor: NaiveDate) -> i8 {
    let window_start = days_in_month(anchor).saturating_sub(ANCHOR_MONTH_END_WINDOW);
    if anchor.day() > window_start { -1 } else { 0 }
}

/// Month names of a fiscal calendar, fixed by its anchor date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthLabels {
    first: usize,
}

impl MonthLabels {
    pub fn for_anchor(anchor: NaiveDate) -> Self {
        let cycle = i64::from(MONTHS_PER_YEAR);
        let shifted = i64::from(anchor.month0()) - i64::from(month_label_offset(anchor));
        Self {
            first: usize::try_from(shifted.rem_euclid(cycle)).unwrap_or(0),
        }
    }

    /// Full name of a fiscal month, e.g. `February`
    pub fn name(self, month: FiscalMonth) -> &'static str {
        MONTH_NAMES[(self.first + month.index()) % MONTH_NAMES.len()]
    }

    /// First three letters of the month name, e.g. `Feb`
    pub fn short_name(self, month: FiscalMonth) -> &'static str {
        let name = self.name(month);
        name.get(..3).unwrap_or(name)
    }
}

/// One resolved fiscal year: where it starts and how long each of its months is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearPartition {
    index: usize,
    fiscal_year: i32,
    start: NaiveDate,
    end: NaiveDate,
    next_start: NaiveDate,
    month_weeks: [u8; 12],
    has_53rd_week: bool,
}

impl YearPartition {
    /// One-based position of this year in the generated sequence
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Fiscal year label, e.g. 2021 for the year starting 2021-01-31
    pub const fn fiscal_year(&self) -> i32 {
        self.fiscal_year
    }

    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the year (always a Saturday for a Sunday anchor)
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// First day of the following fiscal year
    pub const fn next_start(&self) -> NaiveDate {
        self.next_start
    }

    pub const fn month_weeks(&self) -> &[u8; 12] {
        &self.month_weeks
    }

    pub const fn has_53rd_week(&self) -> bool {
        self.has_53rd_week
    }

    pub fn number_of_weeks(&self) -> u8 {
        self.month_weeks.iter().sum()
    }

    pub fn number_of_days(&self) -> u16 {
        u16::from(self.number_of_weeks()) * DAYS_PER_WEEK
    }

    pub fn weeks_in(&self, month: FiscalMonth) -> u8 {
        self.month_weeks[month.index()]
    }

    pub fn days_in(&self, month: FiscalMonth) -> u16 {
        u16::from(self.weeks_in(month)) * DAYS_PER_WEEK
    }

    fn days_before(&self, month: FiscalMonth) -> u16 {
        self.month_weeks[..month.index()]
            .iter()
            .map(|&weeks| u16::from(weeks) * DAYS_PER_WEEK)
            .sum()
    }

    pub fn month_start(&self, month: FiscalMonth) -> NaiveDate {
        self.date_at(self.days_before(month))
    }

    pub fn month_end(&self, month: FiscalMonth) -> NaiveDate {
        self.date_at(self.days_before(month) + self.days_in(month) - 1)
    }

    /// Date `offset` days into the year. Offsets inside the year never pass
    /// `end`, which was range-checked when the year was resolved.
    fn date_at(&self, offset: u16) -> NaiveDate {
        self.start
            .checked_add_days(Days::new(u64::from(offset)))
            .unwrap_or(self.end)
    }

    /// Weeks in a quarter: 13, or 14 for the last quarter of a 53-week year
    pub fn quarter_weeks(&self, quarter: FiscalQuarter) -> u8 {
        let first = usize::from((quarter.get() - 1) * MONTHS_PER_QUARTER);
        self.month_weeks[first..first + usize::from(MONTHS_PER_QUARTER)]
            .iter()
            .sum()
    }

    /// Month holding the day `offset` days into the year, with the day's offset
    /// into that month. `None` past the end of the year.
    pub fn locate(&self, offset: u16) -> Option<(FiscalMonth, u16)> {
        let mut remaining = offset;
        for month in FiscalMonth::all() {
            let days = self.days_in(month);
            if remaining < days {
                return Some((month, remaining));
            }
            remaining -= days;
        }
        None
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end()
    }
}

/// Distance in days between a year's nominal 52-week end and January 31st of the
/// following calendar year.
///
/// # Errors
/// Returns `CalendarError::Invariant` if the reference date is not representable.
pub fn delta_days(fiscal_start: NaiveDate) -> Result<i64, CalendarError> {
    let reference = NaiveDate::from_ymd_opt(
        fiscal_start.year() + 1,
        YEAR_END_REFERENCE_MONTH,
        YEAR_END_REFERENCE_DAY,
    )
    .ok_or_else(|| invariant(format!("no year-end reference date after {fiscal_start}")))?;
    let nominal_end = fiscal_start
        .checked_add_days(Days::new(NOMINAL_YEAR_END_OFFSET.unsigned_abs()))
        .ok_or_else(|| invariant(format!("fiscal year starting {fiscal_start} overflows")))?;
    Ok(nominal_end.signed_duration_since(reference).num_days().abs())
}

/// Weeks in month slot `slot` (1..=12) of a year, in the 4-5-4 pattern.
fn slot_weeks(slot: u8, long_year: bool) -> u8 {
    let middle_of_quarter = (i16::from(slot) - 2).rem_euclid(i16::from(MONTHS_PER_QUARTER)) == 0;
    if middle_of_quarter || (long_year && slot == LAST_FISCAL_MONTH) {
        LONG_MONTH_WEEKS
    } else {
        SHORT_MONTH_WEEKS
    }
}

/// Resolves fiscal years from an anchor date up to an end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiscalYearSequencer {
    anchor: NaiveDate,
    end: NaiveDate,
}

impl FiscalYearSequencer {
    pub const fn new(anchor: NaiveDate, end: NaiveDate) -> Self {
        Self { anchor, end }
    }

    pub const fn from_range(range: &DateRange) -> Self {
        Self::new(range.start(), range.end())
    }

    /// Resolves every fiscal year starting on or before the end date.
    ///
    /// The last year is always complete even if the end date cuts it short.
    ///
    /// # Errors
    /// Returns `CalendarError::Invariant` if a year totals neither 364 nor 371 days.
    pub fn sequence(&self) -> Result<Vec<YearPartition>, CalendarError> {
        let mut years = Vec::new();
        let mut start = self.anchor;

        while start <= self.end {
            let year = self.resolve_year(years.len() + 1, start)?;
            debug!(
                index = year.index,
                fiscal_year = year.fiscal_year,
                start = %year.start,
                weeks = year.number_of_weeks(),
                has_53rd_week = year.has_53rd_week,
                "resolved fiscal year"
            );
            start = year.next_start();
            years.push(year);
        }

        Ok(years)
    }

    fn resolve_year(&self, index: usize, start: NaiveDate) -> Result<YearPartition, CalendarError> {
        let long_year = delta_days(start)? >= LONG_YEAR_DRIFT_DAYS;

        let mut month_weeks = [0; 12];
        for (slot, weeks) in (1..=MONTHS_PER_YEAR).zip(month_weeks.iter_mut()) {
            *weeks = slot_weeks(slot, long_year);
        }

        let offset = i32::try_from(index - 1)
            .map_err(|_| invariant(format!("fiscal year index {index} out of range")))?;
        let fiscal_year = self.anchor.year() + offset;
        let days: u16 = month_weeks.iter().map(|&weeks| u16::from(weeks) * DAYS_PER_WEEK).sum();
        if !matches!(days, DAYS_PER_YEAR | DAYS_PER_LONG_YEAR) {
            return Err(invariant(format!(
                "fiscal year {fiscal_year} starting {start} has {days} days"
            )));
        }

        let next_start = start
            .checked_add_days(Days::new(u64::from(days)))
            .ok_or_else(|| {
                invariant(format!("fiscal year {fiscal_year} runs past the last date"))
            })?;
        let end = next_start
            .pred_opt()
            .ok_or_else(|| invariant(format!("fiscal year {fiscal_year} has no last day")))?;

        Ok(YearPartition {
            index,
            fiscal_year,
            start,
            end,
            next_start,
            month_weeks,
            has_53rd_week: long_year,
        })
    }
}

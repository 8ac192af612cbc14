//! Per-day fiscal attributes.
//!
//! The deriver walks the resolved [`YearPartition`]s day by day and stamps each
//! calendar date with its fiscal week, month, quarter, season and year, along
//! with the boundary dates and lengths of each of those periods.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use tracing::trace;

use crate::consts::{DAYS_PER_WEEK, LONG_MONTH_WEEKS, QUARTER_WEEK_PATTERN, QUARTERS_PER_YEAR};
use crate::dates::{day_id, serialize_day_date};
use crate::sequencer::{MonthLabels, YearPartition};
use crate::types::{DayOfWeek, FiscalMonth, FiscalQuarter, FiscalWeek, FiscalWeekCode, Season};
use crate::{CalendarError, DateRange, invariant};

/// Where a calendar date sits inside the fiscal structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayPosition {
    pub date: NaiveDate,
    /// Zero-based index into the year partitions
    pub year_index: usize,
    /// Days since the fiscal year started
    pub day_of_year: u16,
    pub month: FiscalMonth,
    /// Days since the fiscal month started
    pub day_of_month: u16,
}

impl DayPosition {
    /// Week of the year from grouping days into runs of 7
    ///
    /// # Errors
    /// Returns `CalendarError::Invariant` if the day lies beyond week 53.
    pub fn week_of_year(&self) -> Result<FiscalWeek, CalendarError> {
        u8::try_from(self.day_of_year / DAYS_PER_WEEK + 1)
            .ok()
            .and_then(|week| FiscalWeek::new(week).ok())
            .ok_or_else(|| invariant(format!("{} falls outside week 1-53", self.date)))
    }

    /// Week of the month counted from the partition's own month boundaries
    pub const fn week_of_month(&self) -> u16 {
        self.day_of_month / DAYS_PER_WEEK + 1
    }
}

/// Week-of-month value for every week of a year, built from repeating 4-5-4
/// blocks. A year with a 53rd week gets one trailing 5th week.
pub fn week_of_month_pattern(has_53rd_week: bool) -> Vec<u8> {
    let quarters = usize::from(QUARTERS_PER_YEAR);
    let mut pattern: Vec<u8> = std::iter::repeat_n(QUARTER_WEEK_PATTERN, quarters)
        .flatten()
        .flat_map(|weeks| 1..=weeks)
        .collect();
    if has_53rd_week {
        pattern.push(LONG_MONTH_WEEKS);
    }
    pattern
}

/// Sunday and Saturday of the week holding `date`.
///
/// # Errors
/// Returns `CalendarError::Invariant` if either end falls outside chrono's date range.
pub fn week_bounds(date: NaiveDate) -> Result<(NaiveDate, NaiveDate), CalendarError> {
    let start = date
        .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_sunday())))
        .ok_or_else(|| invariant(format!("week of {date} starts before the first date")))?;
    let end = start
        .checked_add_days(Days::new(u64::from(DAYS_PER_WEEK - 1)))
        .ok_or_else(|| invariant(format!("week of {date} ends after the last date")))?;
    Ok((start, end))
}

/// Every fiscal attribute of one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayAttributes {
    pub time_day_id_pk: String,
    #[serde(serialize_with = "serialize_day_date")]
    pub day_date: NaiveDate,
    pub day_of_week_short_name: &'static str,
    pub day_of_week_name: &'static str,
    pub day_of_week_letter: char,
    pub fiscal_day_of_week: u8,

    pub fiscal_week_of_year: FiscalWeek,
    pub fiscal_week_of_season: u8,
    pub fiscal_week_of_quarter: u8,
    pub fiscal_week_of_month: u8,
    #[serde(serialize_with = "serialize_day_date")]
    pub fiscal_week_start_date: NaiveDate,
    #[serde(serialize_with = "serialize_day_date")]
    pub fiscal_week_end_date: NaiveDate,
    pub fiscal_week_iso_code: FiscalWeekCode,

    pub fiscal_month_of_year: FiscalMonth,
    pub fiscal_month_of_season: u8,
    pub fiscal_month_of_quarter: u8,
    pub fiscal_month_name: &'static str,
    pub fiscal_month_short_name: &'static str,
    #[serde(serialize_with = "serialize_day_date")]
    pub fiscal_month_start_date: NaiveDate,
    #[serde(serialize_with = "serialize_day_date")]
    pub fiscal_month_end_date: NaiveDate,
    pub fiscal_month_number_of_weeks: u8,
    pub fiscal_month_number_of_days: u16,

    pub fiscal_quarter_of_year: FiscalQuarter,
    pub fiscal_quarter_of_year_str: String,
    pub fiscal_quarter_of_season: u8,
    pub fiscal_season_of_year: u8,
    pub fiscal_season_name: Season,

    pub fiscal_year: i32,
    pub fiscal_year_2_digit: String,
    #[serde(serialize_with = "serialize_day_date")]
    pub fiscal_year_start_date: NaiveDate,
    #[serde(serialize_with = "serialize_day_date")]
    pub fiscal_year_end_date: NaiveDate,
    pub fiscal_year_number_of_weeks: u8,
    pub fiscal_year_number_of_days: u16,

    pub first_fiscal_week_of_fiscal_month_ind: u8,
    pub last_fiscal_week_of_fiscal_month_ind: u8,
}

/// Stamps each date of a range with its fiscal attributes.
#[derive(Debug, Clone, Copy)]
pub struct DayAttributeDeriver<'a> {
    years: &'a [YearPartition],
    labels: MonthLabels,
}

impl<'a> DayAttributeDeriver<'a> {
    pub fn new(years: &'a [YearPartition], anchor: NaiveDate) -> Self {
        Self {
            years,
            labels: MonthLabels::for_anchor(anchor),
        }
    }

    /// Positions of every date in `range`, in order.
    ///
    /// Dates are laid out from the first partition's start, so the range start
    /// must be that same anchor date.
    ///
    /// # Errors
    /// Returns `CalendarError::Invariant` if the partitions do not cover the range.
    pub fn positions(&self, range: &DateRange) -> Result<Vec<DayPosition>, CalendarError> {
        let mut positions = Vec::with_capacity(range.num_days());

        'years: for (year_index, year) in self.years.iter().enumerate() {
            let start = year.start();
            for day_of_year in 0..year.number_of_days() {
                let date = start
                    .checked_add_days(Days::new(u64::from(day_of_year)))
                    .ok_or_else(|| {
                        invariant(format!("day {day_of_year} after {start} overflows"))
                    })?;
                if date > range.end() {
                    break 'years;
                }
                let (month, day_of_month) = year.locate(day_of_year).ok_or_else(|| {
                    let fiscal_year = year.fiscal_year();
                    invariant(format!("day {day_of_year} outside fiscal year {fiscal_year}"))
                })?;
                positions.push(DayPosition {
                    date,
                    year_index,
                    day_of_year,
                    month,
                    day_of_month,
                });
            }
        }

        if positions.len() != range.num_days() {
            return Err(invariant(format!(
                "fiscal years cover {} of {} days in {range}",
                positions.len(),
                range.num_days()
            )));
        }
        Ok(positions)
    }

    /// Derives the attributes of every date in `range`.
    ///
    /// # Errors
    /// Returns `CalendarError::Invariant` if the partitions do not cover the range
    /// or the 4-5-4 week-of-month block disagrees with the partition's months.
    pub fn derive(&self, range: &DateRange) -> Result<Vec<DayAttributes>, CalendarError> {
        let positions = self.positions(range)?;
        let patterns: Vec<Vec<u8>> = self
            .years
            .iter()
            .map(|year| week_of_month_pattern(year.has_53rd_week()))
            .collect();

        let days = positions
            .iter()
            .map(|position| {
                let year = self.year(position.year_index)?;
                let pattern = patterns
                    .get(position.year_index)
                    .ok_or_else(|| invariant("missing week-of-month pattern"))?;
                self.derive_day(year, pattern, position)
            })
            .collect::<Result<Vec<_>, _>>()?;

        trace!(days = days.len(), "derived day attributes");
        Ok(days)
    }

    fn year(&self, index: usize) -> Result<&'a YearPartition, CalendarError> {
        self.years
            .get(index)
            .ok_or_else(|| invariant(format!("no fiscal year at index {index}")))
    }

    fn derive_day(
        &self,
        year: &YearPartition,
        pattern: &[u8],
        position: &DayPosition,
    ) -> Result<DayAttributes, CalendarError> {
        let date = position.date;
        let week = position.week_of_year()?;
        let week_of_month = pattern
            .get(usize::from(week.get()) - 1)
            .copied()
            .ok_or_else(|| invariant(format!("week {week} missing from week-of-month block")))?;
        if u16::from(week_of_month) != position.week_of_month() {
            return Err(invariant(format!(
                "{date}: week-of-month block gives {week_of_month}, fiscal month {} gives {}",
                position.month,
                position.week_of_month()
            )));
        }

        let day_of_week = DayOfWeek::from(date.weekday());
        let (week_start, week_end) = week_bounds(date)?;

        let month = position.month;
        let month_days = year.days_in(month);
        let quarter = month.quarter();
        let season = quarter.season();
        let fiscal_year = year.fiscal_year();

        Ok(DayAttributes {
            time_day_id_pk: day_id(date),
            day_date: date,
            day_of_week_short_name: day_of_week.short_name(),
            day_of_week_name: day_of_week.name(),
            day_of_week_letter: day_of_week.letter(),
            fiscal_day_of_week: day_of_week.fiscal_number(),

            fiscal_week_of_year: week,
            fiscal_week_of_season: week.of_season(),
            fiscal_week_of_quarter: week.of_quarter(),
            fiscal_week_of_month: week_of_month,
            fiscal_week_start_date: week_start,
            fiscal_week_end_date: week_end,
            fiscal_week_iso_code: FiscalWeekCode::new(fiscal_year, week),

            fiscal_month_of_year: month,
            fiscal_month_of_season: month.of_season(),
            fiscal_month_of_quarter: month.of_quarter(),
            fiscal_month_name: self.labels.name(month),
            fiscal_month_short_name: self.labels.short_name(month),
            fiscal_month_start_date: year.month_start(month),
            fiscal_month_end_date: year.month_end(month),
            fiscal_month_number_of_weeks: year.weeks_in(month),
            fiscal_month_number_of_days: month_days,

            fiscal_quarter_of_year: quarter,
            fiscal_quarter_of_year_str: quarter.to_string(),
            fiscal_quarter_of_season: quarter.of_season(),
            fiscal_season_of_year: season.number(),
            fiscal_season_name: season,

            fiscal_year,
            fiscal_year_2_digit: format!("{:02}", fiscal_year.rem_euclid(100)),
            fiscal_year_start_date: year.start(),
            fiscal_year_end_date: year.end(),
            fiscal_year_number_of_weeks: year.number_of_weeks(),
            fiscal_year_number_of_days: year.number_of_days(),

            first_fiscal_week_of_fiscal_month_ind: u8::from(week_of_month == 1),
            last_fiscal_week_of_fiscal_month_ind: u8::from(
                position.day_of_month >= month_days - DAYS_PER_WEEK,
            ),
        })
    }
}

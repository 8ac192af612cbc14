mod aligner;
mod consts;
mod dates;
mod deriver;
mod prelude;
mod range;
mod sequencer;
mod types;

pub use aligner::{FiscalDay, Lookback, YearOverYear, YearOverYearAligner};
pub use consts::*;
pub use dates::{day_id, days_in_month, parse_iso_date};
pub use deriver::{
    DayAttributeDeriver, DayAttributes, DayPosition, week_bounds, week_of_month_pattern,
};
pub use range::{DateRange, RangeError};
pub use sequencer::{
    FiscalYearSequencer, MonthLabels, YearPartition, delta_days, month_label_offset,
};
pub use types::{DayOfWeek, FiscalMonth, FiscalQuarter, FiscalWeek, FiscalWeekCode, Season};

use crate::prelude::*;
use chrono::NaiveDate;
use std::str::FromStr;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ParseError {
    #[display(fmt = "Invalid date: {_0} (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[display(fmt = "Invalid format: {_0}")]
    InvalidFormat(String),
    #[display(fmt = "Invalid fiscal week: {} (must be 1-{})", "_0", WEEKS_PER_LONG_YEAR)]
    InvalidWeek(u8),
    #[display(fmt = "Invalid fiscal month: {} (must be 1-{})", "_0", MONTHS_PER_YEAR)]
    InvalidMonth(u8),
    #[display(fmt = "Invalid fiscal quarter: {} (must be 1-{})", "_0", QUARTERS_PER_YEAR)]
    InvalidQuarter(u8),
    #[display(fmt = "Empty input")]
    EmptyInput,
}

impl std::error::Error for ParseError {}

/// Error type for calendar generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Internal consistency check failed; the generated calendar would be wrong.
    #[error("Calendar invariant violated: {0}")]
    Invariant(String),
}

/// Logs and builds an invariant violation.
pub(crate) fn invariant(message: impl Into<String>) -> CalendarError {
    let message = message.into();
    error!(%message, "calendar invariant violated");
    CalendarError::Invariant(message)
}

/// A day-level NRF 4-5-4 fiscal calendar over an inclusive date range.
///
/// The range start is the first day of fiscal year 1 and should be a Sunday.
/// Years are resolved one after another from there, each ending on a Saturday
/// after 52 or 53 weeks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiscalCalendar {
    range: DateRange,
    years: Vec<YearPartition>,
    days:  Vec<FiscalDay>,
}

impl FiscalCalendar {
    /// Builds the calendar for `range`: resolves the fiscal years, derives every
    /// day's attributes, then adds the year-over-year keys.
    ///
    /// # Errors
    /// Returns `CalendarError::Invariant` if any stage produces an inconsistent result.
    pub fn generate(range: DateRange) -> Result<Self, CalendarError> {
        let years = FiscalYearSequencer::from_range(&range).sequence()?;
        let attributes = DayAttributeDeriver::new(&years, range.start()).derive(&range)?;
        let days = YearOverYearAligner::new(&years).align(attributes)?;

        info!(
            %range,
            years = years.len(),
            long_years = years.iter().filter(|year| year.has_53rd_week()).count(),
            days = days.len(),
            "generated fiscal calendar"
        );

        Ok(Self { range, years, days })
    }

    /// Parses `YYYY-MM-DD` bounds and generates the calendar.
    ///
    /// # Errors
    /// Returns `CalendarError::Range` for malformed or reversed dates.
    pub fn from_iso(start: &str, end: &str) -> Result<Self, CalendarError> {
        Self::generate(DateRange::parse(start, end)?)
    }

    pub const fn range(&self) -> DateRange {
        self.range
    }

    pub fn years(&self) -> &[YearPartition] {
        &self.years
    }

    pub fn days(&self) -> &[FiscalDay] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Row for a calendar date, if it falls inside the range
    pub fn get(&self, date: NaiveDate) -> Option<&FiscalDay> {
        self.range.offset_of(date).and_then(|offset| self.days.get(offset))
    }

    /// Fiscal year holding a calendar date
    pub fn year_of(&self, date: NaiveDate) -> Option<&YearPartition> {
        self.years.iter().find(|year| year.contains(date))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FiscalDay> {
        self.days.iter()
    }

    pub fn into_days(self) -> Vec<FiscalDay> {
        self.days
    }
}

impl<'a> IntoIterator for &'a FiscalCalendar {
    type Item = &'a FiscalDay;
    type IntoIter = std::slice::Iter<'a, FiscalDay>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromStr for FiscalCalendar {
    type Err = CalendarError;

    /// Parses a `start/end` range and generates the calendar.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::generate(s.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Days, Weekday};
    use std::collections::{HashMap, HashSet};

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_first_row_of_calendar() {
        let calendar = FiscalCalendar::from_iso("2021-01-31", "2025-02-01").unwrap();
        let first = &calendar.days()[0];

        assert_eq!(first.time_day_id_pk, "20210131");
        assert_eq!(first.fiscal_week_iso_code.to_string(), "2021W01");
        assert_eq!(first.fiscal_day_of_week, 1);
        assert_eq!(first.fiscal_month_name, "February");
    }

    #[test]
    fn test_regular_year_end() {
        let calendar = FiscalCalendar::from_iso("2021-01-31", "2022-06-30").unwrap();
        let year = calendar.year_of(ymd(2021, 6, 1)).unwrap();
        assert_eq!(year.end(), ymd(2022, 1, 29));

        let day = calendar.get(ymd(2022, 1, 29)).unwrap();
        assert_eq!(day.fiscal_year, 2021);
        assert_eq!(day.fiscal_year_end_date, ymd(2022, 1, 29));
        assert_eq!(day.fiscal_year_number_of_weeks, 52);
        assert_eq!(day.fiscal_year_number_of_days, 364);

        let next = calendar.get(ymd(2022, 1, 30)).unwrap();
        assert_eq!(next.fiscal_year, 2022);
        assert_eq!(next.fiscal_week_iso_code.to_string(), "2022W01");
    }

    #[test]
    fn test_53_week_year() {
        let calendar = FiscalCalendar::from_iso("2023-01-29", "2024-02-03").unwrap();
        assert_eq!(calendar.len(), 371);

        let month_12: Vec<_> = calendar
            .iter()
            .filter(|day| day.fiscal_month_of_year.get() == 12)
            .collect();
        assert_eq!(month_12.len(), 35);
        assert!(month_12.iter().all(|day| day.fiscal_month_number_of_days == 35));

        let q4_weeks: HashSet<_> = calendar
            .iter()
            .filter(|day| day.fiscal_quarter_of_year.get() == 4)
            .map(|day| day.fiscal_week_iso_code)
            .collect();
        assert_eq!(q4_weeks.len(), 14);
    }

    #[test]
    fn test_week_keys_look_back_one_year() {
        let calendar = FiscalCalendar::from_iso("2021-01-31", "2025-02-01").unwrap();
        let days = calendar.days();

        for (index, day) in days.iter().enumerate().skip(364) {
            assert_eq!(
                *day.year_over_year().last_year_equiv_week_fk.value(),
                days[index - 364].fiscal_week_iso_code
            );
        }
    }

    #[test]
    fn test_last_year_day_key() {
        let calendar = FiscalCalendar::from_iso("2021-01-31", "2023-01-28").unwrap();
        for day in &calendar {
            let expected = day_id(day.day_date - Days::new(364));
            assert_eq!(day.year_over_year().last_year_equiv_day_fk, expected);
        }
    }

    #[test]
    fn test_day_key_int_matches_date() {
        let calendar = FiscalCalendar::from_iso("2021-01-31", "2021-12-31").unwrap();
        for day in &calendar {
            let key = day.year_over_year().time_day_id_pk_int;
            let date = day.day_date;
            let (year, month, dom) = (key / 10_000, key / 100 % 100, key % 100);
            assert_eq!(ymd(i32::try_from(year).unwrap(), month, dom), date);
            assert_eq!(key.to_string(), day.time_day_id_pk);
        }
    }

    #[test]
    fn test_day_letters_are_one_to_one() {
        let calendar = FiscalCalendar::from_iso("2021-01-31", "2021-02-13").unwrap();
        let letters: HashMap<char, &str> = calendar
            .iter()
            .map(|day| (day.day_of_week_letter, day.day_of_week_short_name))
            .collect();

        assert_eq!(letters.len(), 7);
        let names: HashSet<_> = letters.values().collect();
        assert_eq!(names.len(), 7);
        assert_eq!(letters[&'H'], "THU");
        assert_eq!(letters[&'U'], "SUN");
    }

    #[test]
    fn test_weeks_run_sunday_to_saturday() {
        let calendar = FiscalCalendar::from_iso("2021-01-31", "2025-02-01").unwrap();
        for day in &calendar {
            assert_eq!(day.fiscal_week_start_date.weekday(), Weekday::Sun);
            assert_eq!(day.fiscal_week_end_date.weekday(), Weekday::Sat);
            assert_eq!(
                day.fiscal_week_end_date
                    .signed_duration_since(day.fiscal_week_start_date)
                    .num_days(),
                6
            );
        }
    }

    #[test]
    fn test_years_are_contiguous() {
        let calendar = FiscalCalendar::from_iso("2006-01-29", "2024-12-31").unwrap();
        for pair in calendar.years().windows(2) {
            assert_eq!(pair[0].next_start(), pair[1].start());
        }
        let long_years: Vec<_> = calendar
            .years()
            .iter()
            .filter(|year| year.has_53rd_week())
            .map(YearPartition::fiscal_year)
            .collect();
        assert_eq!(long_years, vec![2006, 2012, 2017, 2023]);
    }

    #[test]
    fn test_get_outside_range() {
        let calendar = FiscalCalendar::from_iso("2021-01-31", "2021-02-06").unwrap();
        assert!(calendar.get(ymd(2021, 1, 30)).is_none());
        assert!(calendar.get(ymd(2021, 2, 7)).is_none());
        assert_eq!(calendar.get(ymd(2021, 2, 6)).unwrap().day_of_week_name, "SATURDAY");
        assert!(calendar.year_of(ymd(2020, 12, 31)).is_none());
    }

    #[test]
    fn test_single_day_calendar() {
        let calendar = FiscalCalendar::from_iso("2021-01-31", "2021-01-31").unwrap();
        assert_eq!(calendar.len(), 1);
        assert!(!calendar.is_empty());
        assert_eq!(calendar.years().len(), 1);
        assert_eq!(calendar.days()[0].fiscal_year_end_date, ymd(2022, 1, 29));
    }

    #[test]
    fn test_from_str() {
        let calendar: FiscalCalendar = "2021-01-31/2021-02-27".parse().unwrap();
        assert_eq!(calendar.len(), 28);
        assert_eq!(calendar.range().to_string(), "2021-01-31/2021-02-27");
        assert_eq!(calendar.into_days().len(), 28);
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(
            FiscalCalendar::from_iso("2022-01-01", "2021-01-01"),
            Err(CalendarError::Range(RangeError::InvalidRange { .. }))
        ));
        assert!(matches!(
            FiscalCalendar::from_iso("2021-02-30", "2022-01-01"),
            Err(CalendarError::Range(RangeError::ParseError(ParseError::InvalidDate(_))))
        ));
        assert!(matches!(
            FiscalCalendar::from_iso("", "2022-01-01"),
            Err(CalendarError::Range(RangeError::ParseError(ParseError::EmptyInput)))
        ));
        assert!(matches!(
            "2021-01-31".parse::<FiscalCalendar>(),
            Err(CalendarError::Range(RangeError::InvalidFormat(_)))
        ));
    }

    #[test]
    fn test_unpadded_or_signed_dates_rejected() {
        assert!(matches!(
            FiscalCalendar::from_iso("2021-1-31", "2021-2-6"),
            Err(CalendarError::Range(RangeError::ParseError(ParseError::InvalidDate(_))))
        ));
        assert!(matches!(
            FiscalCalendar::from_iso("-262143-01-01", "-262143-02-01"),
            Err(CalendarError::Range(RangeError::ParseError(ParseError::InvalidDate(_))))
        ));
        assert!(matches!(
            "+262142-01-01/+262142-02-01".parse::<FiscalCalendar>(),
            Err(CalendarError::Range(RangeError::ParseError(ParseError::InvalidDate(_))))
        ));
    }

    #[test]
    fn test_generate_at_date_limits_returns_error() {
        let end = NaiveDate::MIN.checked_add_days(Days::new(31)).unwrap();
        let range = DateRange::new(NaiveDate::MIN, end).unwrap();
        assert!(matches!(
            FiscalCalendar::generate(range),
            Err(CalendarError::Invariant(_))
        ));

        let start = NaiveDate::MAX.checked_sub_days(Days::new(31)).unwrap();
        let range = DateRange::new(start, NaiveDate::MAX).unwrap();
        assert!(matches!(
            FiscalCalendar::generate(range),
            Err(CalendarError::Invariant(_))
        ));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ParseError::InvalidWeek(54).to_string(),
            "Invalid fiscal week: 54 (must be 1-53)"
        );
        assert_eq!(
            CalendarError::Invariant("year has 365 days".to_owned()).to_string(),
            "Calendar invariant violated: year has 365 days"
        );
        let range_error = RangeError::InvalidRange {
            start: ymd(2022, 1, 1),
            end:   ymd(2021, 1, 1),
        };
        assert_eq!(
            CalendarError::from(range_error).to_string(),
            "Invalid date range: end (2021-01-01) is before start (2022-01-01)"
        );
    }

    #[test]
    fn test_serialized_row_columns() {
        let calendar = FiscalCalendar::from_iso("2021-01-31", "2021-02-06").unwrap();
        let row = serde_json::to_value(&calendar.days()[0]).unwrap();

        assert_eq!(row["time_day_id_pk"], "20210131");
        assert_eq!(row["time_day_id_pk_int"], 20_210_131);
        assert_eq!(row["day_date"], "01/31/2021");
        assert_eq!(row["day_of_week_letter"], "U");
        assert_eq!(row["fiscal_week_of_year"], 1);
        assert_eq!(row["fiscal_week_start_date"], "01/31/2021");
        assert_eq!(row["fiscal_week_end_date"], "02/06/2021");
        assert_eq!(row["fiscal_week_iso_code"], "2021W01");
        assert_eq!(row["fiscal_month_of_year"], 1);
        assert_eq!(row["fiscal_month_short_name"], "Feb");
        assert_eq!(row["fiscal_quarter_of_year"], 1);
        assert_eq!(row["fiscal_quarter_of_year_str"], "Q1");
        assert_eq!(row["fiscal_season_name"], "SPRING");
        assert_eq!(row["fiscal_year_2_digit"], "21");
        assert_eq!(row["fiscal_year_end_date"], "01/29/2022");
        assert_eq!(row["last_year_equiv_day_fk"], "20200202");
        assert_eq!(row["last_year_equiv_day_date"], "02/02/2020");
        assert_eq!(row["last_year_equiv_week_fk"], "2020W01");
        assert_eq!(row["last_year_fiscal_year"], 2020);
        assert_eq!(row["last_year_fiscal_month_of_year"], 1);
        assert_eq!(row["prior_year_from_last_year_equiv_week_fk"], "2019W01");
        assert_eq!(row["time_fiscal_week_id_fk"], "2021W01");
        assert_eq!(row["first_fiscal_week_of_fiscal_month_ind"], 1);
        assert_eq!(row["last_fiscal_week_of_fiscal_month_ind"], 0);
    }
}

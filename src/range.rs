use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{ParseError, RANGE_SEPARATOR, dates::parse_iso_date, prelude::*};

/// Inclusive range of calendar dates a fiscal calendar is generated for.
/// The start date must be less than or equal to the end date.
/// The start date is the anchor: the first day of fiscal year 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display(fmt = "{start}/{end}")]
pub struct DateRange {
    start: NaiveDate,
    end:   NaiveDate,
}

/// Error type for date range operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// End date is before start date.
    #[error("Invalid date range: end ({end}) is before start ({start})")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// Error parsing date component.
    #[error(transparent)]
    ParseError(#[from] ParseError),

    /// Invalid range format.
    #[error("Invalid range format: {0}")]
    InvalidFormat(String),
}

impl DateRange {
    /// Creates a new date range with validation.
    ///
    /// # Errors
    /// Returns `RangeError::InvalidRange` if end < start.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if end < start {
            return Err(RangeError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses `YYYY-MM-DD` start and end dates.
    ///
    /// # Errors
    /// Returns `RangeError::ParseError` if either date is malformed, and
    /// `RangeError::InvalidRange` if end < start.
    pub fn parse(start: &str, end: &str) -> Result<Self, RangeError> {
        let start = parse_iso_date(start)?;
        let end = parse_iso_date(end)?;
        Self::new(start, end)
    }

    /// Returns the start (anchor) date of the range
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Returns the end date of the range (inclusive)
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered, counting both ends
    pub fn num_days(&self) -> usize {
        let span = self.end.signed_duration_since(self.start).num_days();
        usize::try_from(span).map_or(0, |days| days + 1)
    }

    /// Checks if the range contains a given date
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Zero-based position of `date` within the range
    pub fn offset_of(&self, date: NaiveDate) -> Option<usize> {
        if !self.contains(date) {
            return None;
        }
        usize::try_from(date.signed_duration_since(self.start).num_days()).ok()
    }

    /// Every date of the range in ascending order
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.num_days()).filter_map(|offset| {
            self.start.checked_add_days(Days::new(offset as u64))
        })
    }
}

impl FromStr for DateRange {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        // ISO 8601 interval format: RANGE_SEPARATOR between start and end
        let separator_count = trimmed.matches(RANGE_SEPARATOR).count();

        match separator_count {
            0 => Err(RangeError::InvalidFormat(format!(
                "No range separator found (expected '{RANGE_SEPARATOR}'): {s}"
            ))),
            1 => {
                let (start_str, end_str) = trimmed.split_once(RANGE_SEPARATOR).ok_or_else(|| {
                    RangeError::InvalidFormat(format!(
                        "Separator '{RANGE_SEPARATOR}' not found despite count == 1"
                    ))
                })?;
                Self::parse(start_str, end_str)
            },
            _ => Err(RangeError::InvalidFormat(format!(
                "Too many '{RANGE_SEPARATOR}' separators: expected 1, found {separator_count}"
            ))),
        }
    }
}

impl Serialize for DateRange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DateRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_range_new_valid() {
        let range = DateRange::new(ymd(2021, 1, 31), ymd(2022, 1, 29)).unwrap();
        assert_eq!(range.start(), ymd(2021, 1, 31));
        assert_eq!(range.end(), ymd(2022, 1, 29));
        assert_eq!(range.num_days(), 364);
    }

    #[test]
    fn test_range_single_day() {
        let range = DateRange::new(ymd(2021, 1, 31), ymd(2021, 1, 31)).unwrap();
        assert_eq!(range.num_days(), 1);
        assert_eq!(range.dates().collect::<Vec<_>>(), vec![ymd(2021, 1, 31)]);
    }

    #[test]
    fn test_range_new_invalid() {
        let result = DateRange::new(ymd(2022, 1, 29), ymd(2021, 1, 31));
        assert!(matches!(
            result,
            Err(RangeError::InvalidRange { start, end })
                if start == ymd(2022, 1, 29) && end == ymd(2021, 1, 31)
        ));
    }

    #[test]
    fn test_range_parse() {
        let range = DateRange::parse("2021-01-31", "2025-02-01").unwrap();
        assert_eq!(range.start(), ymd(2021, 1, 31));
        assert_eq!(range.end(), ymd(2025, 2, 1));
    }

    #[test]
    fn test_range_parse_malformed() {
        assert!(matches!(
            DateRange::parse("2021-13-01", "2022-01-01"),
            Err(RangeError::ParseError(ParseError::InvalidDate(_)))
        ));
        assert!(matches!(
            DateRange::parse("2021-01-31", ""),
            Err(RangeError::ParseError(ParseError::EmptyInput))
        ));
        assert!(matches!(
            DateRange::parse("2022-01-31", "2021-01-31"),
            Err(RangeError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_range_contains_and_offset() {
        let range = DateRange::parse("2021-01-31", "2021-02-06").unwrap();
        assert!(range.contains(ymd(2021, 1, 31)));
        assert!(range.contains(ymd(2021, 2, 6)));
        assert!(!range.contains(ymd(2021, 1, 30)));
        assert!(!range.contains(ymd(2021, 2, 7)));

        assert_eq!(range.offset_of(ymd(2021, 1, 31)), Some(0));
        assert_eq!(range.offset_of(ymd(2021, 2, 6)), Some(6));
        assert_eq!(range.offset_of(ymd(2021, 2, 7)), None);
    }

    #[test]
    fn test_range_dates() {
        let range = DateRange::parse("2021-02-26", "2021-03-02").unwrap();
        let dates: Vec<_> = range.dates().collect();
        assert_eq!(
            dates,
            vec![
                ymd(2021, 2, 26),
                ymd(2021, 2, 27),
                ymd(2021, 2, 28),
                ymd(2021, 3, 1),
                ymd(2021, 3, 2),
            ]
        );
    }

    #[test]
    fn test_range_from_str() {
        let range: DateRange = "2021-01-31/2022-01-29".parse().unwrap();
        assert_eq!(range.start(), ymd(2021, 1, 31));
        assert_eq!(range.end(), ymd(2022, 1, 29));

        let range: DateRange = " 2021-01-31 / 2022-01-29 ".parse().unwrap();
        assert_eq!(range.num_days(), 364);
    }

    #[test]
    fn test_range_from_str_invalid() {
        assert!(matches!(
            "2021-01-31".parse::<DateRange>(),
            Err(RangeError::InvalidFormat(_))
        ));
        assert!(matches!(
            "2021-01-31/2022-01-29/2023-01-28".parse::<DateRange>(),
            Err(RangeError::InvalidFormat(_))
        ));
        assert!(matches!(
            "2022-01-29/2021-01-31".parse::<DateRange>(),
            Err(RangeError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_range_display() {
        let range = DateRange::parse("2021-01-31", "2022-01-29").unwrap();
        assert_eq!(range.to_string(), "2021-01-31/2022-01-29");
    }

    #[test]
    fn test_range_serde() {
        let range = DateRange::parse("2021-01-31", "2022-01-29").unwrap();
        let json = serde_json::to_string(&range).unwrap();
        assert_eq!(json, "\"2021-01-31/2022-01-29\"");

        let parsed: DateRange = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, range);

        let invalid: Result<DateRange, _> = serde_json::from_str("\"2022-01-29/2021-01-31\"");
        assert!(invalid.is_err());
    }

    #[test]
    fn test_range_in_config_struct() {
        #[derive(Deserialize)]
        struct CalendarConfig {
            range: DateRange,
        }

        let config: CalendarConfig =
            serde_json::from_str(r#"{"range":"2021-01-31/2025-02-01"}"#).unwrap();
        assert_eq!(config.range.start(), ymd(2021, 1, 31));
        assert_eq!(config.range.end(), ymd(2025, 2, 1));
    }
}

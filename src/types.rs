use crate::ParseError;
use crate::consts::{
    MONTHS_PER_QUARTER, MONTHS_PER_SEASON, MONTHS_PER_YEAR, QUARTERS_PER_SEASON, QUARTERS_PER_YEAR,
    WEEK_CODE_SEPARATOR, WEEKS_PER_LONG_YEAR, WEEKS_PER_QUARTER, WEEKS_PER_SEASON,
};
use crate::prelude::*;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU8;
use std::str::FromStr;

/// A fiscal week of the year guaranteed to be in the range `1..=WEEKS_PER_LONG_YEAR` (1..=53)
/// Uses `NonZeroU8` internally, so 0 is not a valid week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FiscalWeek(NonZeroU8);

impl FiscalWeek {
    /// Creates a new `FiscalWeek`, validating that it's non-zero and <= `WEEKS_PER_LONG_YEAR`
    ///
    /// # Errors
    /// Returns `ParseError::InvalidWeek` if the value is 0 or > `WEEKS_PER_LONG_YEAR`.
    pub fn new(value: u8) -> Result<Self, ParseError> {
        let non_zero = NonZeroU8::new(value).ok_or(ParseError::InvalidWeek(value))?;
        if value > WEEKS_PER_LONG_YEAR {
            return Err(ParseError::InvalidWeek(value));
        }
        Ok(Self(non_zero))
    }

    /// Returns the week value as u8
    #[inline]
    pub const fn get(self) -> u8 {
        self.0.get()
    }

    /// Week within the fiscal season (1..=26, or 27 for a 53rd week)
    pub const fn of_season(self) -> u8 {
        let week = self.get();
        if week <= WEEKS_PER_SEASON {
            week
        } else {
            week - WEEKS_PER_SEASON
        }
    }

    /// Week within the fiscal quarter (1..=13, or 14 for a 53rd week)
    pub const fn of_quarter(self) -> u8 {
        let week = self.get();
        if week <= WEEKS_PER_QUARTER {
            week
        } else if week <= 2 * WEEKS_PER_QUARTER {
            week - WEEKS_PER_QUARTER
        } else if week <= 3 * WEEKS_PER_QUARTER {
            week - 2 * WEEKS_PER_QUARTER
        } else {
            week - 3 * WEEKS_PER_QUARTER
        }
    }
}

impl TryFrom<u8> for FiscalWeek {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FiscalWeek> for u8 {
    fn from(week: FiscalWeek) -> Self {
        week.0.get()
    }
}

impl fmt::Display for FiscalWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fiscal month of the year guaranteed to be in the range `1..=MONTHS_PER_YEAR` (1..=12)
/// Uses `NonZeroU8` internally, so 0 is not a valid month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FiscalMonth(NonZeroU8);

impl FiscalMonth {
    /// Creates a new `FiscalMonth`, validating that it's non-zero and <= `MONTHS_PER_YEAR`
    ///
    /// # Errors
    /// Returns `ParseError::InvalidMonth` if the value is 0 or > `MONTHS_PER_YEAR`.
    pub fn new(value: u8) -> Result<Self, ParseError> {
        let non_zero = NonZeroU8::new(value).ok_or(ParseError::InvalidMonth(value))?;
        if value > MONTHS_PER_YEAR {
            return Err(ParseError::InvalidMonth(value));
        }
        Ok(Self(non_zero))
    }

    /// Returns the month value as u8
    #[inline]
    pub const fn get(self) -> u8 {
        self.0.get()
    }

    /// Zero-based position in the fiscal year
    #[inline]
    pub const fn index(self) -> usize {
        (self.get() - 1) as usize
    }

    /// Iterates months 1 through 12 in fiscal order
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=MONTHS_PER_YEAR).filter_map(|m| Self::new(m).ok())
    }

    /// Month within the fiscal season (1..=6)
    pub const fn of_season(self) -> u8 {
        let month = self.get();
        if month <= MONTHS_PER_SEASON {
            month
        } else {
            month - MONTHS_PER_SEASON
        }
    }

    /// Month within the fiscal quarter (1..=3)
    pub const fn of_quarter(self) -> u8 {
        match self.get() % MONTHS_PER_QUARTER {
            0 => MONTHS_PER_QUARTER,
            m => m,
        }
    }

    /// Quarter holding this month
    pub fn quarter(self) -> FiscalQuarter {
        // ceil(month / 3) is always 1..=4 for a valid month
        let q = self.get().div_ceil(MONTHS_PER_QUARTER);
        FiscalQuarter(NonZeroU8::new(q).unwrap_or(NonZeroU8::MIN))
    }
}

impl TryFrom<u8> for FiscalMonth {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FiscalMonth> for u8 {
    fn from(month: FiscalMonth) -> Self {
        month.0.get()
    }
}

impl fmt::Display for FiscalMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fiscal quarter guaranteed to be in the range `1..=QUARTERS_PER_YEAR` (1..=4)
/// Displays as `Q1`..`Q4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
#[display(fmt = "Q{}", "_0")]
#[serde(try_from = "u8", into = "u8")]
pub struct FiscalQuarter(NonZeroU8);

impl FiscalQuarter {
    /// Creates a new `FiscalQuarter`, validating that it's non-zero and <= `QUARTERS_PER_YEAR`
    ///
    /// # Errors
    /// Returns `ParseError::InvalidQuarter` if the value is 0 or > `QUARTERS_PER_YEAR`.
    pub fn new(value: u8) -> Result<Self, ParseError> {
        let non_zero = NonZeroU8::new(value).ok_or(ParseError::InvalidQuarter(value))?;
        if value > QUARTERS_PER_YEAR {
            return Err(ParseError::InvalidQuarter(value));
        }
        Ok(Self(non_zero))
    }

    /// Returns the quarter value as u8
    #[inline]
    pub const fn get(self) -> u8 {
        self.0.get()
    }

    /// Quarter within the fiscal season (1..=2)
    pub const fn of_season(self) -> u8 {
        let quarter = self.get();
        if quarter <= QUARTERS_PER_SEASON {
            quarter
        } else {
            quarter - QUARTERS_PER_SEASON
        }
    }

    /// Season holding this quarter
    pub const fn season(self) -> Season {
        if self.get() <= QUARTERS_PER_SEASON {
            Season::Spring
        } else {
            Season::Fall
        }
    }
}

impl TryFrom<u8> for FiscalQuarter {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FiscalQuarter> for u8 {
    fn from(quarter: FiscalQuarter) -> Self {
        quarter.0.get()
    }
}

/// Half of a fiscal year: quarters 1-2 are spring, 3-4 are fall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Season {
    #[display(fmt = "SPRING")]
    Spring,
    #[display(fmt = "FALL")]
    Fall,
}

impl Season {
    /// Season of the year as 1 (spring) or 2 (fall)
    pub const fn number(self) -> u8 {
        match self {
            Self::Spring => 1,
            Self::Fall => 2,
        }
    }
}

/// Weekday in the Sunday-first fiscal week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From, Into)]
pub struct DayOfWeek(Weekday);

const DAY_SHORT_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];
const DAY_NAMES: [&str; 7] = [
    "SUNDAY",
    "MONDAY",
    "TUESDAY",
    "WEDNESDAY",
    "THURSDAY",
    "FRIDAY",
    "SATURDAY",
];
// Thursday is H so every letter is unique
const DAY_LETTERS: [char; 7] = ['U', 'M', 'T', 'W', 'H', 'F', 'S'];

impl DayOfWeek {
    #[inline]
    fn index(self) -> usize {
        self.0.num_days_from_sunday() as usize
    }

    /// Sunday = 1 through Saturday = 7
    pub fn fiscal_number(self) -> u8 {
        self.0.number_from_sunday() as u8
    }

    pub fn short_name(self) -> &'static str {
        DAY_SHORT_NAMES[self.index()]
    }

    pub fn name(self) -> &'static str {
        DAY_NAMES[self.index()]
    }

    pub fn letter(self) -> char {
        DAY_LETTERS[self.index()]
    }
}

/// Fiscal week identifier in `YYYYWww` form, e.g. `2021W01`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display(fmt = "{:04}W{:02}", "year", "week.get()")]
pub struct FiscalWeekCode {
    year: i32,
    week: FiscalWeek,
}

impl FiscalWeekCode {
    pub const fn new(year: i32, week: FiscalWeek) -> Self {
        Self { year, week }
    }

    pub const fn year(&self) -> i32 {
        self.year
    }

    pub const fn week(&self) -> FiscalWeek {
        self.week
    }

    /// Same week number, `years` fiscal years earlier.
    pub const fn previous_year(self, years: i32) -> Self {
        Self {
            year: self.year - years,
            week: self.week,
        }
    }
}

impl FromStr for FiscalWeekCode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let (year_str, week_str) = trimmed
            .split_once(WEEK_CODE_SEPARATOR)
            .ok_or_else(|| ParseError::InvalidFormat(trimmed.to_owned()))?;
        if year_str.len() != 4 || week_str.len() != 2 {
            return Err(ParseError::InvalidFormat(trimmed.to_owned()));
        }

        let year = year_str
            .parse::<i32>()
            .map_err(|_| ParseError::InvalidFormat(trimmed.to_owned()))?;
        let week = week_str
            .parse::<u8>()
            .map_err(|_| ParseError::InvalidFormat(trimmed.to_owned()))?;

        Ok(Self::new(year, FiscalWeek::new(week)?))
    }
}

impl Serialize for FiscalWeekCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FiscalWeekCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

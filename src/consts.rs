/// Days in one fiscal week (Sunday through Saturday)
pub const DAYS_PER_WEEK: u16 = 7;

/// Weeks in a regular fiscal year
pub const WEEKS_PER_YEAR: u8 = 52;
/// Weeks in a fiscal year carrying a 53rd week
pub const WEEKS_PER_LONG_YEAR: u8 = 53;

/// Days in a regular fiscal year (52 * 7)
pub const DAYS_PER_YEAR: u16 = 364;
/// Days in a fiscal year carrying a 53rd week (53 * 7)
pub const DAYS_PER_LONG_YEAR: u16 = 371;

/// Fiscal months per fiscal year
pub const MONTHS_PER_YEAR: u8 = 12;
/// Fiscal months per fiscal quarter
pub const MONTHS_PER_QUARTER: u8 = 3;
/// Fiscal months per fiscal season
pub const MONTHS_PER_SEASON: u8 = 6;
/// Fiscal quarters per fiscal year
pub const QUARTERS_PER_YEAR: u8 = 4;
/// Fiscal quarters per fiscal season
pub const QUARTERS_PER_SEASON: u8 = 2;

/// Weeks in a regular fiscal quarter (4 + 5 + 4)
pub const WEEKS_PER_QUARTER: u8 = 13;
/// Weeks in a regular fiscal season (two quarters)
pub const WEEKS_PER_SEASON: u8 = 26;

/// Weeks in a short fiscal month
pub const SHORT_MONTH_WEEKS: u8 = 4;
/// Weeks in a long fiscal month
pub const LONG_MONTH_WEEKS: u8 = 5;

/// Week lengths of the months in one regular quarter
pub const QUARTER_WEEK_PATTERN: [u8; 3] = [SHORT_MONTH_WEEKS, LONG_MONTH_WEEKS, SHORT_MONTH_WEEKS];

/// Fiscal month that absorbs the 53rd week
pub const LAST_FISCAL_MONTH: u8 = 12;

/// Calendar month of the fiscal year-end reference date (January)
pub(crate) const YEAR_END_REFERENCE_MONTH: u32 = 1;
/// Calendar day of the fiscal year-end reference date (the 31st)
pub(crate) const YEAR_END_REFERENCE_DAY: u32 = 31;
/// Offset from a fiscal year start to its nominal last day
pub(crate) const NOMINAL_YEAR_END_OFFSET: i64 = 363;
/// Drift from the reference date at which the year gets a 53rd week
pub(crate) const LONG_YEAR_DRIFT_DAYS: i64 = 4;

/// Anchors within this many days of their month end shift the month labels back
pub(crate) const ANCHOR_MONTH_END_WINDOW: u32 = 5;

/// Offset to the year-over-year equivalent day (52 * 7)
pub const LAST_YEAR_OFFSET_DAYS: u16 = 364;
/// Offset to the equivalent day two fiscal years back (364 * 2)
pub const PRIOR_YEAR_OFFSET_DAYS: u16 = 728;

/// Full calendar month names, January first
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Input date format (ISO 8601)
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";
/// Length of a `YYYY-MM-DD` date
pub const ISO_DATE_LEN: usize = 10;
/// Primary key format of a day row
pub const DAY_ID_FORMAT: &str = "%Y%m%d";
/// Output format of every date column
pub const DAY_DATE_FORMAT: &str = "%m/%d/%Y";

/// Separator between a fiscal year and its week number in a week code
pub const WEEK_CODE_SEPARATOR: char = 'W';
/// Range separator (ISO 8601 interval format)
pub const RANGE_SEPARATOR: char = '/';

use chrono::{Datelike, Months, NaiveDate};
use serde::Serializer;

use crate::ParseError;
use crate::consts::{DAY_DATE_FORMAT, DAY_ID_FORMAT, ISO_DATE_FORMAT, ISO_DATE_LEN};

/// Parses a strict `YYYY-MM-DD` date.
///
/// # Errors
/// Returns `ParseError::EmptyInput` for blank input and `ParseError::InvalidDate`
/// when the text is not a real calendar date.
pub fn parse_iso_date(s: &str) -> Result<NaiveDate, ParseError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyInput);
    }
    if !has_iso_date_shape(trimmed) {
        return Err(ParseError::InvalidDate(trimmed.to_owned()));
    }
    NaiveDate::parse_from_str(trimmed, ISO_DATE_FORMAT)
        .map_err(|_| ParseError::InvalidDate(trimmed.to_owned()))
}

/// Exactly `dddd-dd-dd`: 4-digit year, 2-digit month and day, no sign.
fn has_iso_date_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == ISO_DATE_LEN
        && bytes.iter().enumerate().all(|(i, &b)| {
            if i == 4 || i == 7 { b == b'-' } else { b.is_ascii_digit() }
        })
}

/// Number of days in the calendar month holding `date`.
pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    first
        .checked_add_months(Months::new(1))
        .map_or(31, |next| {
            u32::try_from(next.signed_duration_since(first).num_days()).unwrap_or(31)
        })
}

/// `YYYYMMDD` key of a date.
pub fn day_id(date: NaiveDate) -> String {
    date.format(DAY_ID_FORMAT).to_string()
}

/// Serializes a date column as `MM/DD/YYYY`.
pub(crate) fn serialize_day_date<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&date.format(DAY_DATE_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_iso_date("2021-01-31").unwrap(), ymd(2021, 1, 31));
        assert_eq!(parse_iso_date(" 2021-01-31 ").unwrap(), ymd(2021, 1, 31));
    }

    #[test]
    fn test_parse_iso_date_invalid() {
        assert!(matches!(parse_iso_date(""), Err(ParseError::EmptyInput)));
        assert!(matches!(parse_iso_date("   "), Err(ParseError::EmptyInput)));
        assert!(matches!(parse_iso_date("2021-02-30"), Err(ParseError::InvalidDate(_))));
        assert!(matches!(parse_iso_date("01/31/2021"), Err(ParseError::InvalidDate(_))));
        assert!(matches!(parse_iso_date("not a date"), Err(ParseError::InvalidDate(_))));
    }

    #[test]
    fn test_parse_iso_date_requires_padded_fields() {
        struct TestCase {
            input: &'static str,
        }

        let cases = [
            TestCase { input: "2021-1-31" },
            TestCase { input: "2021-01-1" },
            TestCase { input: "21-01-31" },
            TestCase { input: "02021-01-31" },
            TestCase { input: "+2021-01-31" },
            TestCase { input: "-262143-01-01" },
            TestCase { input: "+262142-01-01" },
            TestCase { input: "2021/01/31" },
            TestCase { input: "2021-01-31T00" },
        ];

        for case in cases {
            let result = parse_iso_date(case.input);
            assert!(
                matches!(&result, Err(ParseError::InvalidDate(s)) if s == case.input),
                "accepted {}",
                case.input
            );
        }
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(ymd(2021, 1, 31)), 31);
        assert_eq!(days_in_month(ymd(2021, 2, 10)), 28);
        assert_eq!(days_in_month(ymd(2024, 2, 10)), 29);
        assert_eq!(days_in_month(ymd(1900, 2, 1)), 28);
        assert_eq!(days_in_month(ymd(2000, 2, 1)), 29);
        assert_eq!(days_in_month(ymd(2021, 4, 30)), 30);
        assert_eq!(days_in_month(ymd(2021, 12, 1)), 31);
    }

    #[test]
    fn test_day_id() {
        assert_eq!(day_id(ymd(2021, 1, 31)), "20210131");
        assert_eq!(day_id(ymd(2022, 2, 3)), "20220203");
    }

    #[test]
    fn test_serialize_day_date() {
        #[derive(serde::Serialize)]
        struct Row {
            #[serde(serialize_with = "serialize_day_date")]
            day_date: NaiveDate,
        }

        let json = serde_json::to_string(&Row { day_date: ymd(2022, 1, 30) }).unwrap();
        assert_eq!(json, r#"{"day_date":"01/30/2022"}"#);
    }
}

//! Date parsing for the two formats the snapshots use:
//! `YYYY-MM-DD` and `MMM-YYYY` (e.g. `Jan-2021`, resolved to the 1st of the month).

use chrono::NaiveDate;

use crate::domain::DateFormat;
use crate::error::ParseError;

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Detect the format of `s` and parse it.
pub fn parse_date(s: &str) -> Result<NaiveDate, ParseError> {
    parse_date_as(s, DateFormat::Auto)
}

/// Parse `s`, accepting only the formats allowed by `format`.
pub fn parse_date_as(s: &str, format: DateFormat) -> Result<NaiveDate, ParseError> {
    let s = s.trim();
    let allow_iso = matches!(format, DateFormat::Iso | DateFormat::Auto);
    let allow_month_year = matches!(format, DateFormat::MonthYear | DateFormat::Auto);

    if allow_iso && is_iso_shape(s) {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| ParseError::InvalidDate {
            input: s.to_string(),
        });
    }
    if allow_month_year && is_month_year_shape(s) {
        let (token, year) = s.split_at(3);
        let month = month_index(token).ok_or_else(|| ParseError::UnknownMonth {
            input: s.to_string(),
            token: token.to_string(),
        })?;
        let year: i32 = year[1..].parse().map_err(|_| ParseError::InvalidDate {
            input: s.to_string(),
        })?;
        return NaiveDate::from_ymd_opt(year, month + 1, 1).ok_or_else(|| ParseError::InvalidDate {
            input: s.to_string(),
        });
    }

    Err(ParseError::UnsupportedDateFormat {
        input: s.to_string(),
    })
}

/// 0-based month index for a three-letter abbreviation, case-insensitive.
pub fn month_index(token: &str) -> Option<u32> {
    let lower = token.to_ascii_lowercase();
    MONTHS.iter().position(|m| *m == lower).map(|i| i as u32)
}

/// `^\d{4}-\d{2}-\d{2}$`
fn is_iso_shape(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b.iter().enumerate().all(|(i, c)| match i {
            4 | 7 => *c == b'-',
            _ => c.is_ascii_digit(),
        })
}

/// `^[A-Za-z]{3}-\d{4}$`
fn is_month_year_shape(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 8
        && b.iter().enumerate().all(|(i, c)| match i {
            0..=2 => c.is_ascii_alphabetic(),
            3 => *c == b'-',
            _ => c.is_ascii_digit(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_date("2020-02-29").unwrap(), d(2020, 2, 29));
        assert_eq!(parse_date(" 2021-12-01 ").unwrap(), d(2021, 12, 1));
    }

    #[test]
    fn parses_month_year_case_insensitively() {
        assert_eq!(parse_date("Jan-2021").unwrap(), d(2021, 1, 1));
        assert_eq!(parse_date("DEC-2019").unwrap(), d(2019, 12, 1));
        assert_eq!(parse_date("sep-2022").unwrap(), d(2022, 9, 1));
    }

    #[test]
    fn unknown_month_never_defaults_to_january() {
        let err = parse_date("Foo-2021").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownMonth {
                input: "Foo-2021".to_string(),
                token: "Foo".to_string(),
            }
        );
    }

    #[test]
    fn rejects_other_formats() {
        for s in ["01/02/2020", "2020-1-1", "January-2021", "", "2020-01-01T00:00"] {
            assert!(
                matches!(parse_date(s), Err(ParseError::UnsupportedDateFormat { .. })),
                "{s:?} should be unsupported"
            );
        }
    }

    #[test]
    fn rejects_impossible_calendar_dates() {
        assert!(matches!(parse_date("2021-02-30"), Err(ParseError::InvalidDate { .. })));
    }

    #[test]
    fn pinned_format_refuses_the_other_shape() {
        assert!(parse_date_as("Jan-2021", DateFormat::Iso).is_err());
        assert!(parse_date_as("2021-01-01", DateFormat::MonthYear).is_err());
        assert_eq!(parse_date_as("Mar-2020", DateFormat::MonthYear).unwrap(), d(2020, 3, 1));
    }

    #[test]
    fn month_index_is_zero_based() {
        assert_eq!(month_index("jan"), Some(0));
        assert_eq!(month_index("Dec"), Some(11));
        assert_eq!(month_index("xyz"), None);
    }
}

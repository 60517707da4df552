use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BirthdayError {
    #[error("Unrecognised birthday: {0:?}")]
    Unparseable(String),
    #[error("Timestamp out of range: {0}")]
    OutOfRange(i64),
}

/// A birthday as clients send it: either a structured timestamp
/// (`{"seconds": .., "nanoseconds": ..}`) or a date string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum BirthdayInput {
    Timestamp {
        seconds: i64,
        #[serde(default)]
        nanoseconds: u32,
    },
    Text(String),
}

const TEXT_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y"];

impl BirthdayInput {
    /// Collapse either representation into the stored calendar date.
    pub fn normalize(&self) -> Result<NaiveDate, BirthdayError> {
        match self {
            BirthdayInput::Timestamp {
                seconds,
                nanoseconds,
            } => DateTime::from_timestamp(*seconds, *nanoseconds)
                .map(|dt| dt.date_naive())
                .ok_or(BirthdayError::OutOfRange(*seconds)),
            BirthdayInput::Text(raw) => {
                let s = raw.trim();
                if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                    return Ok(dt.date_naive());
                }
                TEXT_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                    .ok_or_else(|| BirthdayError::Unparseable(raw.clone()))
            }
        }
    }
}

/// One row of the birthday list.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BirthdayEntry {
    pub initials: String,
    /// e.g. "Jul 10"
    pub formatted_birthday: String,
    /// "MM-dd", calendar order within a year.
    pub sort_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> BirthdayInput {
        BirthdayInput::Text(s.to_string())
    }

    #[test]
    fn parses_supported_string_forms() {
        let expected = NaiveDate::from_ymd_opt(1990, 7, 10).unwrap();
        assert_eq!(text("1990-07-10").normalize(), Ok(expected));
        assert_eq!(text("07/10/1990").normalize(), Ok(expected));
        assert_eq!(text("July 10, 1990").normalize(), Ok(expected));
        assert_eq!(text("Jul 10, 1990").normalize(), Ok(expected));
        assert_eq!(text("1990-07-10T08:00:00Z").normalize(), Ok(expected));
    }

    #[test]
    fn structured_timestamp_uses_utc_day() {
        // 2000-02-29T12:00:00Z
        let ts = BirthdayInput::Timestamp {
            seconds: 951_825_600,
            nanoseconds: 0,
        };
        assert_eq!(ts.normalize(), Ok(NaiveDate::from_ymd_opt(2000, 2, 29).unwrap()));
    }

    #[test]
    fn garbage_is_an_error() {
        assert_eq!(
            text("sometime in june").normalize(),
            Err(BirthdayError::Unparseable("sometime in june".into()))
        );
    }

    #[test]
    fn deserializes_both_shapes() {
        let a: BirthdayInput = serde_json::from_str(r#"{"seconds": 10, "nanoseconds": 5}"#).unwrap();
        assert!(matches!(a, BirthdayInput::Timestamp { seconds: 10, nanoseconds: 5 }));
        let b: BirthdayInput = serde_json::from_str(r#""1990-01-01""#).unwrap();
        assert_eq!(b, text("1990-01-01"));
    }
}

//! Feed date parsing
//!
//! The feed emits dates as `YYYY-MM-DDT00:HH:00`. The literal zero hour
//! field and the hour placeholder in the minute position are quirks of the
//! upstream serializer and must be matched exactly, not "fixed" to plain
//! ISO 8601.

use crate::error::ImportError;
use chrono::NaiveDate;

/// The feed's timestamp pattern; only the date part is kept
pub const SOURCE_DATE_FORMAT: &str = "%Y-%m-%dT00:%H:00";

/// Parse a feed date; malformed input fails the record
pub fn parse_source_date(value: &str) -> Result<NaiveDate, ImportError> {
    NaiveDate::parse_from_str(value, SOURCE_DATE_FORMAT).map_err(|source| {
        ImportError::MalformedDate {
            value: value.to_string(),
            source,
        }
    })
}

/// Parse an optional feed date; absent stays unset (open-ended)
pub fn parse_optional_date(value: Option<&str>) -> Result<Option<NaiveDate>, ImportError> {
    value.map(parse_source_date).transpose()
}

//! Repository utilities.

use chrono::NaiveDate;
use diesel::result::DatabaseErrorInformation;

/// Date format of every `*_date` text column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Largest number of values bound into a single `IN (...)` list.
pub const QUERY_CHUNK_SIZE: usize = 1000;

/// Simple error info wrapper for database errors.
#[derive(Debug)]
pub struct DbErrorInfo(pub String);

impl DatabaseErrorInformation for DbErrorInfo {
    fn message(&self) -> &str {
        &self.0
    }
    fn details(&self) -> Option<&str> {
        None
    }
    fn hint(&self) -> Option<&str> {
        None
    }
    fn table_name(&self) -> Option<&str> {
        None
    }
    fn column_name(&self) -> Option<&str> {
        None
    }
    fn constraint_name(&self) -> Option<&str> {
        None
    }
    fn statement_position(&self) -> Option<i32> {
        None
    }
}

/// Convert any displayable error to a diesel error with proper message.
pub fn to_diesel_error(e: impl std::fmt::Display) -> diesel::result::Error {
    diesel::result::Error::DatabaseError(
        diesel::result::DatabaseErrorKind::Unknown,
        Box::new(DbErrorInfo(e.to_string())),
    )
}

/// Strip an optional `sqlite:` / `sqlite://` prefix, leaving the file path.
pub fn sqlite_path(url: &str) -> &str {
    url.strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url)
}

/// Parse a stored date column.
pub fn parse_date(s: &str) -> Result<NaiveDate, diesel::result::Error> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| to_diesel_error(format!("invalid date '{}': {}", s, e)))
}

/// Format a date for storage.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_path() {
        assert_eq!(sqlite_path("sqlite:///var/db.sqlite"), "/var/db.sqlite");
        assert_eq!(sqlite_path("sqlite:data.db"), "data.db");
        assert_eq!(sqlite_path("data.db"), "data.db");
    }

    #[test]
    fn test_date_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
        assert_eq!(format_date(date), "2020-06-01");
        assert_eq!(parse_date("2020-06-01").unwrap(), date);
        assert!(parse_date("06/01/2020").is_err());
    }
}

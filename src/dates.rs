//! Conversion of calendar dates to decimal years.
//!
//! Tip names of dated trees often carry their sampling date, e.g.
//! `A/Auckland/12/2020|2020-07-01`. For plotting against time these are
//! turned into fractional years, `2020-07-01` becoming `2020.4959`.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

/// Error raised when a date cannot be converted.
#[derive(Error, Debug)]
pub enum DateError {
    #[error("Cannot parse date '{date}' with format '{format}'")]
    Unparseable {
        date: String,
        format: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("Date '{0}' is out of the supported range")]
    OutOfRange(String),
}

/// Conversion settings with their usual defaults:
/// format `%Y-%m-%d`, no variable precision, components split at `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalDate {
    pub format: String,
    pub variable: bool,
    pub splitter: String,
}

impl Default for DecimalDate {
    fn default() -> Self {
        Self {
            format: String::from("%Y-%m-%d"),
            variable: false,
            splitter: String::from("-"),
        }
    }
}

impl DecimalDate {
    /// Accepts dates with fewer components than the format, e.g. `2020`
    /// or `2020-07` for `%Y-%m-%d`.
    pub fn with_variable(mut self, variable: bool) -> Self {
        self.variable = variable;
        self
    }

    pub fn with_format<S: Into<String>>(mut self, format: S) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_splitter<S: Into<String>>(mut self, splitter: S) -> Self {
        self.splitter = splitter.into();
        self
    }

    /// Converts `date` with these settings; see [decimal_date].
    pub fn convert(&self, date: &str) -> Result<f64, DateError> {
        decimal_date(date, &self.format, self.variable, &self.splitter)
    }
}

/// Converts a calendar date into a decimal year.
///
/// A value that already reads as a number is returned as is.
/// With `variable`, a date with fewer `splitter`-separated components than
/// `fmt` is accepted and its missing components count as the first
/// month/day, so `2020` becomes exactly `2020.0`.
///
/// # Arguments
/// * `date` - Date string, e.g. `2020-07-01`
/// * `fmt` - `chrono` format string, e.g. `%Y-%m-%d`
/// * `variable` - Whether trailing components may be missing
/// * `splitter` - Separator between date components
///
/// # Errors
/// [DateError::Unparseable] if `date` does not match `fmt`.
///
/// # Example
/// ```
/// use phylotraits::dates::decimal_date;
///
/// let mid_year = decimal_date("2020-07-01", "%Y-%m-%d", false, "-").unwrap();
/// assert!(mid_year > 2020.49 && mid_year < 2020.5);
/// assert_eq!(decimal_date("2020-01", "%Y-%m-%d", true, "-").unwrap(), 2020.0);
/// assert_eq!(decimal_date("2019.25", "%Y-%m-%d", false, "-").unwrap(), 2019.25);
/// ```
pub fn decimal_date(date: &str, fmt: &str, variable: bool, splitter: &str) -> Result<f64, DateError> {
    if is_float(date) {
        return Ok(date.trim().parse::<f64>().unwrap_or_default());
    }

    let mut padded = date.trim().to_string();
    if variable && !splitter.is_empty() {
        let expected = fmt.split(splitter).count();
        let found = padded.split(splitter).count();
        for _ in found..expected {
            padded.push_str(splitter);
            padded.push_str("01");
        }
    }

    let parsed = NaiveDate::parse_from_str(&padded, fmt).map_err(|source| DateError::Unparseable {
        date: date.to_string(),
        format: fmt.to_string(),
        source,
    })?;

    let out_of_range = || DateError::OutOfRange(date.to_string());
    let year = parsed.year();
    let begin = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(out_of_range)?;
    let end = NaiveDate::from_ymd_opt(year + 1, 1, 1).ok_or_else(out_of_range)?;

    let elapsed = (parsed - begin).num_seconds() as f64;
    let total = (end - begin).num_seconds() as f64;
    Ok(year as f64 + elapsed / total)
}

/// [decimal_date] with the [DecimalDate] defaults.
pub fn decimal_date_default(date: &str) -> Result<f64, DateError> {
    DecimalDate::default().convert(date)
}

/// Whether `value` (surrounding whitespace ignored) parses as a float.
///
/// ```
/// use phylotraits::dates::is_float;
///
/// assert!(is_float(" 2020.5 "));
/// assert!(is_float("2020"));
/// assert!(!is_float("2020-07-01"));
/// ```
pub fn is_float(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mid_year() {
        let value = decimal_date_default("2020-07-01").unwrap();
        assert!(value > 2020.0 && value < 2021.0);
        // 182 of 366 days elapsed in the leap year 2020
        assert!((value - (2020.0 + 182.0 / 366.0)).abs() < 1e-9);
    }

    #[test]
    fn test_first_of_january() {
        assert_eq!(decimal_date_default("2021-01-01").unwrap(), 2021.0);
    }

    #[test]
    fn test_variable_precision() {
        let settings = DecimalDate::default().with_variable(true);
        assert_eq!(settings.convert("2020").unwrap(), 2020.0);
        assert_eq!(settings.convert("2020-01").unwrap(), 2020.0);
        let march = settings.convert("2019-03").unwrap();
        assert!((march - (2019.0 + 59.0 / 365.0)).abs() < 1e-9);
    }

    #[test]
    fn test_year_only_without_variable_is_float() {
        assert_eq!(decimal_date_default("2020").unwrap(), 2020.0);
    }

    #[test]
    fn test_partial_date_needs_variable() {
        let err = decimal_date_default("2020-07").unwrap_err();
        assert!(matches!(err, DateError::Unparseable { .. }));
    }

    #[test]
    fn test_custom_format_and_splitter() {
        let settings = DecimalDate::default()
            .with_format("%d/%m/%Y")
            .with_splitter("/");
        let value = settings.convert("01/07/2020").unwrap();
        assert_eq!(value, decimal_date_default("2020-07-01").unwrap());
    }

    #[test]
    fn test_garbage() {
        assert!(decimal_date_default("last tuesday").is_err());
    }
}

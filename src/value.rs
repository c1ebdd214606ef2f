use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::{
    DateTime, NaiveDate, NaiveDateTime, NaiveTime,
    ParseError as ChronoParseError,
};
use rust_decimal::Decimal;

/// The kind of a record field.
///
/// Every field of a record shape has exactly one kind, which determines how
/// raw CSV cells are coerced before being assigned to the field.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrimitiveKind {
    /// A `String`, assigned verbatim.
    Text,
    /// An `i32`.
    Integer,
    /// A `rust_decimal::Decimal`.
    Decimal,
    /// A `chrono::NaiveDateTime`.
    DateTime,
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PrimitiveKind::Text => write!(f, "text"),
            PrimitiveKind::Integer => write!(f, "integer"),
            PrimitiveKind::Decimal => write!(f, "decimal"),
            PrimitiveKind::DateTime => write!(f, "datetime"),
        }
    }
}

/// A single coerced cell.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// A raw cell.
    Text(String),
    /// A cell parsed as an integer.
    Integer(i32),
    /// A cell parsed as a decimal number.
    Decimal(Decimal),
    /// A cell parsed as a date, with or without a time of day.
    DateTime(NaiveDateTime),
}

impl Value {
    /// The kind of this value.
    pub fn kind(&self) -> PrimitiveKind {
        match *self {
            Value::Text(_) => PrimitiveKind::Text,
            Value::Integer(_) => PrimitiveKind::Integer,
            Value::Decimal(_) => PrimitiveKind::Decimal,
            Value::DateTime(_) => PrimitiveKind::DateTime,
        }
    }

    /// Returns the text of this value if it is `Value::Text`.
    pub fn as_text(&self) -> Option<&str> {
        match *self {
            Value::Text(ref s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer of this value if it is `Value::Integer`.
    pub fn as_integer(&self) -> Option<i32> {
        match *self {
            Value::Integer(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the decimal of this value if it is `Value::Decimal`.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match *self {
            Value::Decimal(d) => Some(d),
            _ => None,
        }
    }

    /// Returns the date and time of this value if it is `Value::DateTime`.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match *self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::Text(ref s) => s.fmt(f),
            Value::Integer(n) => n.fmt(f),
            Value::Decimal(d) => d.fmt(f),
            Value::DateTime(dt) => dt.fmt(f),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Text(s)
    }
}

impl<'a> From<&'a str> for Value {
    fn from(s: &'a str) -> Value {
        Value::Text(s.to_string())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Value {
        Value::Integer(n)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Value {
        Value::Decimal(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Value {
        Value::DateTime(dt)
    }
}

/// Parse a cell as an `i32`.
///
/// Surrounding whitespace is ignored. An empty cell is an error.
pub fn parse_integer(cell: &str) -> Result<i32, ParseIntError> {
    cell.trim().parse()
}

/// Parse a cell as a decimal number.
///
/// Surrounding whitespace is ignored. Exponent notation (`1.5e3`) is not
/// accepted.
pub fn parse_decimal(cell: &str) -> Result<Decimal, rust_decimal::Error> {
    Decimal::from_str(cell.trim())
}

/// A single accepted date or date and time format.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DateFormat {
    /// A `chrono` format string describing both a date and a time.
    DateTime(String),
    /// A `chrono` format string describing only a date. Parsed values are
    /// set to midnight.
    Date(String),
    /// An RFC 3339 timestamp with an offset. Parsed values are converted to
    /// UTC.
    Rfc3339,
}

impl DateFormat {
    fn parse(&self, cell: &str) -> Result<NaiveDateTime, ChronoParseError> {
        match *self {
            DateFormat::DateTime(ref fmt) => {
                NaiveDateTime::parse_from_str(cell, fmt)
            }
            DateFormat::Date(ref fmt) => NaiveDate::parse_from_str(cell, fmt)
                .map(|d| d.and_time(NaiveTime::MIN)),
            DateFormat::Rfc3339 => {
                DateTime::parse_from_rfc3339(cell).map(|dt| dt.naive_utc())
            }
        }
    }
}

/// Parses cells into dates by trying each of its formats in order.
///
/// The first format that parses the whole (trimmed) cell wins.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DateParser {
    formats: Vec<DateFormat>,
}

impl Default for DateParser {
    fn default() -> DateParser {
        let datetimes = [
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M",
            "%Y/%m/%d %H:%M:%S",
            "%Y/%m/%d %H:%M",
            "%m/%d/%Y %H:%M:%S",
            "%m/%d/%Y %I:%M:%S %p",
            "%m/%d/%Y %H:%M",
        ];
        let dates =
            ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %B %Y", "%d %b %Y"];

        let mut formats = vec![DateFormat::Rfc3339];
        formats.extend(
            datetimes.iter().map(|f| DateFormat::DateTime(f.to_string())),
        );
        formats.extend(dates.iter().map(|f| DateFormat::Date(f.to_string())));
        DateParser { formats }
    }
}

impl DateParser {
    /// Create a parser that accepts exactly the given formats.
    pub fn new<I>(formats: I) -> DateParser
    where
        I: IntoIterator<Item = DateFormat>,
    {
        DateParser { formats: formats.into_iter().collect() }
    }

    /// Add a format, tried after all existing ones.
    pub fn push(&mut self, format: DateFormat) {
        self.formats.push(format);
    }

    /// The formats accepted by this parser, in the order they are tried.
    pub fn formats(&self) -> &[DateFormat] {
        &self.formats
    }

    /// Parse a cell as a date.
    ///
    /// Surrounding whitespace is ignored. When no format matches, the error
    /// from the last format tried is returned. A parser without formats
    /// rejects everything.
    pub fn parse(&self, cell: &str) -> Result<NaiveDateTime, DateParseError> {
        let cell = cell.trim();
        let mut last = None;
        for format in &self.formats {
            match format.parse(cell) {
                Ok(dt) => return Ok(dt),
                Err(err) => last = Some(err),
            }
        }
        Err(DateParseError { input: cell.to_string(), err: last })
    }
}

/// An error that occurs when no date format matches a cell.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DateParseError {
    input: String,
    err: Option<ChronoParseError>,
}

impl DateParseError {
    /// The (trimmed) cell that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl std::error::Error for DateParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.err.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl fmt::Display for DateParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.err {
            None => {
                write!(f, "no date formats configured for {:?}", self.input)
            }
            Some(ref err) => {
                write!(f, "{:?} is not a recognized date: {}", self.input, err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{
        parse_decimal, parse_integer, DateFormat, DateParser, PrimitiveKind,
        Value,
    };

    fn ymd(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn integer() {
        assert_eq!(parse_integer("42").unwrap(), 42);
        assert_eq!(parse_integer(" -7 ").unwrap(), -7);
        assert_eq!(parse_integer("+3").unwrap(), 3);
    }

    #[test]
    fn integer_errors() {
        assert!(parse_integer("").is_err());
        assert!(parse_integer("1.5").is_err());
        assert!(parse_integer("abc").is_err());
        assert!(parse_integer("3000000000").is_err());
    }

    #[test]
    fn decimal() {
        assert_eq!(parse_decimal("1.25").unwrap(), Decimal::new(125, 2));
        assert_eq!(parse_decimal(" -3 ").unwrap(), Decimal::new(-3, 0));
    }

    #[test]
    fn decimal_errors() {
        assert!(parse_decimal("").is_err());
        assert!(parse_decimal("twelve").is_err());
        assert!(parse_decimal("1.5e2").is_err());
        assert!(parse_decimal("2E3").is_err());
    }

    #[test]
    fn date_only() {
        let p = DateParser::default();
        assert_eq!(p.parse("2024-01-05").unwrap(), ymd(2024, 1, 5));
        assert_eq!(p.parse("2024/01/05").unwrap(), ymd(2024, 1, 5));
        assert_eq!(p.parse("01/05/2024").unwrap(), ymd(2024, 1, 5));
        assert_eq!(p.parse("5 January 2024").unwrap(), ymd(2024, 1, 5));
        assert_eq!(p.parse(" 2024-01-05 ").unwrap(), ymd(2024, 1, 5));
    }

    #[test]
    fn date_and_time() {
        let p = DateParser::default();
        let want = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(13, 45, 10)
            .unwrap();
        assert_eq!(p.parse("2024-01-05T13:45:10").unwrap(), want);
        assert_eq!(p.parse("2024-01-05 13:45:10").unwrap(), want);
        assert_eq!(p.parse("01/05/2024 01:45:10 PM").unwrap(), want);
        assert_eq!(p.parse("2024-01-05T15:45:10+02:00").unwrap(), want);
    }

    #[test]
    fn date_errors() {
        let p = DateParser::default();
        assert!(p.parse("").is_err());
        assert!(p.parse("Widget").is_err());
        assert!(p.parse("2024-13-45").is_err());
        let err = p.parse(" nope ").unwrap_err();
        assert_eq!(err.input(), "nope");
    }

    #[test]
    fn date_custom_formats() {
        let mut p = DateParser::new(vec![]);
        assert!(p.parse("2024-01-05").is_err());
        p.push(DateFormat::Date("%d.%m.%Y".to_string()));
        assert_eq!(p.parse("05.01.2024").unwrap(), ymd(2024, 1, 5));
        assert!(p.parse("2024-01-05").is_err());
    }

    #[test]
    fn value_kind() {
        assert_eq!(Value::from("x").kind(), PrimitiveKind::Text);
        assert_eq!(Value::from(1).kind(), PrimitiveKind::Integer);
        assert_eq!(
            Value::from(Decimal::new(1, 0)).kind(),
            PrimitiveKind::Decimal
        );
        assert_eq!(
            Value::from(ymd(2024, 1, 1)).kind(),
            PrimitiveKind::DateTime
        );
        assert_eq!(Value::from(7).as_integer(), Some(7));
        assert_eq!(Value::from(7).as_text(), None);
    }
}

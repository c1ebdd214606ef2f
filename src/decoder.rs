use std::error::Error as StdError;
use std::fmt;
use std::num::ParseIntError;

use csvmap_core::Cells;

use crate::column_map::ColumnMap;
use crate::shape::Shape;
use crate::value::{
    parse_decimal, parse_integer, DateParseError, DateParser, PrimitiveKind,
    Value,
};
use crate::DELIMITER;

use self::DecodeErrorKind as DEK;

/// Decode a single data line into a fresh record.
///
/// The line is split on commas and each cell whose column appears in `map`
/// is coerced according to the kind of the field it maps to. Cells in
/// unmapped columns, including cells beyond the end of the header, are
/// ignored. Fields without a cell keep the value given to them by the
/// shape's factory.
///
/// Coercion applies the following rules in order. They are not exclusive:
/// when more than one applies, each assigns the field in turn and the last
/// one wins.
///
/// 1. A decimal field with a non-empty cell is parsed as a decimal. An empty
///    cell leaves the field untouched.
/// 2. An integer field is parsed as an `i32`. An empty cell is an error.
/// 3. A text field is assigned the cell verbatim.
/// 4. A date field, or any field whose name contains `date` (in any case)
///    when the cell happens to parse as a date, is parsed as a date.
///
/// Rule 4 can therefore fire for a text field named, e.g., `ShipDate`. A
/// typed setter cannot store a date in a text field, which is reported as a
/// `DecodeErrorKind::Mismatch`. Dynamic rows accept the date.
///
/// The first failure aborts the line.
pub fn decode_line<T>(
    line: &str,
    map: &ColumnMap,
    shape: &Shape<T>,
    dates: &DateParser,
) -> Result<T, DecodeError> {
    let mut record = shape.create();
    for (column, cell) in Cells::new(line, DELIMITER).enumerate() {
        let name = match map.get(column) {
            None => continue,
            Some(name) => name,
        };
        let field = match resolve(map, shape, column, name) {
            None => continue,
            Some(field) => field,
        };
        let target = Target { shape, field, column, name };
        let kind = shape.descriptors()[field].kind();

        if kind == PrimitiveKind::Decimal && !cell.is_empty() {
            let d = parse_decimal(cell)
                .map_err(|err| target.error(DEK::ParseDecimal(err)))?;
            target.assign(&mut record, Value::Decimal(d))?;
        }
        if kind == PrimitiveKind::Integer {
            let n = parse_integer(cell)
                .map_err(|err| target.error(DEK::ParseInt(err)))?;
            target.assign(&mut record, Value::Integer(n))?;
        }
        if kind == PrimitiveKind::Text {
            target.assign(&mut record, Value::Text(cell.to_string()))?;
        }
        // The speculative parse only decides whether this rule applies; the
        // assigned value comes from a second parse.
        let date_named = name.to_lowercase().contains("date");
        if kind == PrimitiveKind::DateTime
            || (date_named && dates.parse(cell).is_ok())
        {
            let dt = dates
                .parse(cell)
                .map_err(|err| target.error(DEK::ParseDateTime(err)))?;
            target.assign(&mut record, Value::DateTime(dt))?;
        }
    }
    Ok(record)
}

/// Find the shape field for a mapped column.
///
/// The map normally records the declaration index of the field, but a map
/// may have been built from descriptors other than the shape's own. In that
/// case, fall back to looking the field up by name.
fn resolve<T>(
    map: &ColumnMap,
    shape: &Shape<T>,
    column: usize,
    name: &str,
) -> Option<usize> {
    let indexed = map
        .field_index(column)
        .filter(|&i| {
            shape.descriptors().get(i).map(|d| d.name()) == Some(name)
        });
    indexed.or_else(|| shape.position(name))
}

/// The field currently being assigned, used to attach context to errors.
struct Target<'a, T> {
    shape: &'a Shape<T>,
    field: usize,
    column: usize,
    name: &'a str,
}

impl<'a, T> Target<'a, T> {
    fn error(&self, kind: DecodeErrorKind) -> DecodeError {
        DecodeError {
            column: self.column,
            field: self.name.to_string(),
            kind,
        }
    }

    fn assign(&self, record: &mut T, value: Value) -> Result<(), DecodeError> {
        self.shape.assign(self.field, record, value).map_err(|value| {
            self.error(DEK::Mismatch {
                expected: self.shape.descriptors()[self.field].kind(),
                got: value.kind(),
            })
        })
    }
}

/// An error that occurs when a cell cannot be decoded into its field.
#[derive(Debug)]
pub struct DecodeError {
    column: usize,
    field: String,
    kind: DecodeErrorKind,
}

/// The specific kind of a `DecodeError`.
#[derive(Debug)]
pub enum DecodeErrorKind {
    /// The cell of an integer field is not an `i32`.
    ParseInt(ParseIntError),
    /// The non-empty cell of a decimal field is not a decimal number.
    ParseDecimal(rust_decimal::Error),
    /// The cell of a date field matches none of the configured formats.
    ParseDateTime(DateParseError),
    /// The field cannot store a value of the kind produced for it.
    Mismatch {
        /// The kind of the field.
        expected: PrimitiveKind,
        /// The kind of the value that was produced.
        got: PrimitiveKind,
    },
}

impl DecodeError {
    /// Return the column index (starting at 0) of the offending cell.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Return the name of the field the cell maps to.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Return the underlying error kind.
    pub fn kind(&self) -> &DecodeErrorKind {
        &self.kind
    }
}

impl StdError for DecodeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self.kind {
            DEK::ParseInt(ref err) => Some(err),
            DEK::ParseDecimal(ref err) => Some(err),
            DEK::ParseDateTime(ref err) => Some(err),
            DEK::Mismatch { .. } => None,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "column {} (field '{}'): {}",
            self.column, self.field, self.kind
        )
    }
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DEK::ParseInt(ref err) => write!(f, "invalid integer: {}", err),
            DEK::ParseDecimal(ref err) => {
                write!(f, "invalid decimal: {}", err)
            }
            DEK::ParseDateTime(ref err) => write!(f, "invalid date: {}", err),
            DEK::Mismatch { expected, got } => write!(
                f,
                "cannot assign a {} value to a {} field",
                got, expected
            ),
        }
    }
}

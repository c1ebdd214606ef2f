/*!
The `csvmap` crate parses CSV data into typed records, working out which
column fills which field from the header row.

Instead of describing the layout of a CSV file up front, callers describe the
record they want (a `Shape`): the name and kind of each field and how to set
it. The header row is then matched against those names, ignoring spaces, and
every following data line is decoded into a fresh record. Cells are coerced
according to the kind of their field: text, `i32` integers,
`rust_decimal::Decimal` numbers or `chrono::NaiveDateTime` dates.

The input format is simple and somewhat peculiar:

* The first line is the header.
* The second line is always skipped. It typically holds units or a
  description of each column.
* Every other non-empty line is a record.
* Cells are separated by commas. Quoting is not supported.
* Lines end with `\r\n` if that sequence appears anywhere, and `\n` otherwise.

# Example

```
use csvmap::{ReaderBuilder, Shape};
use chrono::NaiveDate;

#[derive(Debug, Default, PartialEq)]
struct Order {
    id: i32,
    name: String,
    order_date: chrono::NaiveDateTime,
}

let shape = Shape::<Order>::new()
    .integer("Id", |o, v| o.id = v)
    .text("Name", |o, v| o.name = v)
    .datetime("OrderDate", |o, v| o.order_date = v);

let data = "\
Id,Name,Order Date
ignored-second-row
1,Widget,2024-01-05
2,Gadget,2024-02-10
";
let orders = ReaderBuilder::new().parse_str(data, &shape)?;

assert_eq!(orders.len(), 2);
assert_eq!(orders[1].name, "Gadget");
assert_eq!(
    orders[0].order_date.date(),
    NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
);
# Ok::<(), csvmap::Error>(())
```

Reading from an asynchronous source works the same way through `Reader`,
which drains its input before decoding anything.

# Errors

The first cell that cannot be coerced aborts the whole parse with an `Error`
that records the offending line. Columns that match no field, rows with too
few or too many cells, and empty lines are not errors.
*/

#![deny(missing_docs)]

pub use crate::column_map::{ColumnMap, ColumnMapIter};
pub use crate::decoder::{decode_line, DecodeError, DecodeErrorKind};
pub use crate::error::{Error, ErrorKind, Position, Result, Utf8Error};
pub use crate::reader::{Reader, ReaderBuilder};
pub use crate::shape::{FieldDescriptor, Row, Shape};
pub use crate::value::{
    parse_decimal, parse_integer, DateFormat, DateParseError, DateParser,
    PrimitiveKind, Value,
};

pub use csvmap_core::Terminator;

mod column_map;
mod decoder;
mod error;
mod reader;
mod shape;
mod value;

/// The cell delimiter. Only commas are supported.
const DELIMITER: u8 = b',';

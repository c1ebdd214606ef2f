use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::result;

use crate::decoder::{DecodeError, DecodeErrorKind};

/// A type alias for `Result<T, csvmap::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when parsing CSV data into records.
///
/// Parsing stops at the first error; no records are returned alongside it.
/// Note that columns without a matching field, rows with too few or too many
/// cells and empty lines are never errors.
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    /// A crate private constructor for `Error`.
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }

    /// Return the specific type of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Unwrap this error into its underlying type.
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns true if this is an I/O error.
    ///
    /// If this is true, the underlying `ErrorKind` is guaranteed to be
    /// `ErrorKind::Io`.
    pub fn is_io_error(&self) -> bool {
        match *self.0 {
            ErrorKind::Io(_) => true,
            _ => false,
        }
    }

    /// Returns true if a cell could not be coerced to the kind of its field.
    ///
    /// This excludes kind mismatches between a value and a setter.
    pub fn is_format_error(&self) -> bool {
        match *self.0 {
            ErrorKind::Decode { ref err, .. } => match *err.kind() {
                DecodeErrorKind::Mismatch { .. } => false,
                _ => true,
            },
            _ => false,
        }
    }

    /// Return the position of the line that caused this error, if available.
    pub fn position(&self) -> Option<&Position> {
        match *self.0 {
            ErrorKind::Decode { ref pos, .. } => Some(pos),
            _ => None,
        }
    }
}

/// The specific type of an error.
#[derive(Debug)]
pub enum ErrorKind {
    /// An I/O error that occurred while reading CSV data.
    Io(io::Error),
    /// The CSV data is not valid UTF-8. This only occurs when lossy decoding
    /// is disabled.
    Utf8 {
        /// The 1-based line number containing the invalid data.
        line: u64,
        /// The corresponding UTF-8 error.
        err: Utf8Error,
    },
    /// A data line could not be decoded into a record.
    Decode {
        /// The position of the offending line.
        pos: Position,
        /// The decoding error.
        err: DecodeError,
    },
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::new(ErrorKind::Io(err))
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        io::Error::new(io::ErrorKind::Other, err)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self.0 {
            ErrorKind::Io(ref err) => Some(err),
            ErrorKind::Utf8 { ref err, .. } => Some(err),
            ErrorKind::Decode { ref err, .. } => Some(err),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            ErrorKind::Io(ref err) => err.fmt(f),
            ErrorKind::Utf8 { line, ref err } => {
                write!(f, "CSV parse error: line {}: {}", line, err)
            }
            ErrorKind::Decode { ref pos, ref err } => write!(
                f,
                "CSV decode error: record {} (line {}): {}",
                pos.record(),
                pos.line(),
                err
            ),
        }
    }
}

/// The position of a data line within CSV input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Position {
    line: u64,
    record: u64,
}

impl Position {
    /// Returns a new position for the given line and record.
    pub fn new(line: u64, record: u64) -> Position {
        Position { line, record }
    }

    /// The line number, starting at 1. The header is on line 1.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The record index, starting at 0. This counts the records produced
    /// before this line; the header, the skipped second line and empty lines
    /// are not records.
    pub fn record(&self) -> u64 {
        self.record
    }
}

/// A UTF-8 validation error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Utf8Error {
    /// The byte offset in the input up to which valid UTF-8 was verified.
    valid_up_to: usize,
}

/// Create a new UTF-8 error.
pub(crate) fn new_utf8_error(valid_up_to: usize) -> Utf8Error {
    Utf8Error { valid_up_to }
}

impl Utf8Error {
    /// The byte offset in the input up to which valid UTF-8 was verified.
    pub fn valid_up_to(&self) -> usize {
        self.valid_up_to
    }
}

impl StdError for Utf8Error {}

impl fmt::Display for Utf8Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid UTF-8 near byte index {}", self.valid_up_to)
    }
}

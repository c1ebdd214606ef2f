use std::borrow::Cow;
use std::path::Path;

use bstr::ByteSlice;
use csvmap_core::{Lines, Terminator};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace};

use crate::column_map::ColumnMap;
use crate::decoder::decode_line;
use crate::error::{new_utf8_error, Error, ErrorKind, Position, Result};
use crate::shape::Shape;
use crate::value::{DateFormat, DateParser};

const BOM: char = '\u{feff}';

/// Builds a CSV reader with various configuration knobs.
///
/// This builder can be used to tweak the accepted date formats and how
/// invalid UTF-8 is handled. Once configured, it can build any number of
/// readers, or parse in-memory data directly.
///
/// Every reader built here, and every in-memory parse, removes a leading
/// byte order mark before reading the header.
///
/// # Example
///
/// ```
/// use csvmap::{DateFormat, ReaderBuilder, Shape};
/// use chrono::NaiveDateTime;
///
/// #[derive(Debug, Default)]
/// struct Payment {
///     paid_date: NaiveDateTime,
/// }
///
/// let shape = Shape::<Payment>::new()
///     .datetime("PaidDate", |p, v| p.paid_date = v);
///
/// let data = "Paid Date\nDD.MM.YYYY\n05.01.2024\n";
/// let payments = ReaderBuilder::new()
///     .date_format(DateFormat::Date("%d.%m.%Y".to_string()))
///     .parse_str(data, &shape)
///     .unwrap();
///
/// assert_eq!(payments[0].paid_date.to_string(), "2024-01-05 00:00:00");
/// ```
#[derive(Clone, Debug)]
pub struct ReaderBuilder {
    config: Config,
}

impl Default for ReaderBuilder {
    fn default() -> ReaderBuilder {
        ReaderBuilder { config: Config::default() }
    }
}

impl ReaderBuilder {
    /// Create a new builder for configuring CSV parsing.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Build a CSV reader from this configuration that reads data from `rdr`.
    ///
    /// Note that the reader does not need to be buffered; the whole input
    /// is read into memory before parsing begins.
    pub fn from_reader<R: AsyncRead + Unpin>(&self, rdr: R) -> Reader<R> {
        Reader { rdr, config: self.config.clone() }
    }

    /// Build a CSV reader from this configuration that reads data from the
    /// given file path.
    ///
    /// If there was a problem opening the file, then this returns an error.
    pub async fn from_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<Reader<File>> {
        Ok(self.from_reader(File::open(path).await?))
    }

    /// Replace the accepted date formats.
    ///
    /// Formats are tried in the order given. With no formats at all, every
    /// date cell fails to parse.
    pub fn date_formats<I>(&mut self, formats: I) -> &mut ReaderBuilder
    where
        I: IntoIterator<Item = DateFormat>,
    {
        self.config.dates = DateParser::new(formats);
        self
    }

    /// Accept an additional date format, tried after all others.
    pub fn date_format(&mut self, format: DateFormat) -> &mut ReaderBuilder {
        self.config.dates.push(format);
        self
    }

    /// Whether to replace invalid UTF-8 with `U+FFFD` instead of failing.
    ///
    /// This is enabled by default.
    pub fn lossy_utf8(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.config.lossy = yes;
        self
    }

    /// Parse CSV text that is already in memory.
    pub fn parse_str<T>(
        &self,
        text: &str,
        shape: &Shape<T>,
    ) -> Result<Vec<T>> {
        self.config.parse_str(text, shape)
    }

    /// Parse CSV bytes that are already in memory.
    pub fn parse_bytes<T>(
        &self,
        bytes: &[u8],
        shape: &Shape<T>,
    ) -> Result<Vec<T>> {
        self.config.parse_bytes(bytes, shape)
    }
}

/// A CSV reader that turns its input into records.
///
/// The first line of the input is the header, which determines which column
/// fills which field (see `ColumnMap`). The second line is always skipped,
/// whatever it contains. Every following non-empty line becomes one record.
///
/// Lines end with `\r\n` if that sequence occurs anywhere in the input, and
/// with `\n` otherwise. Cells are separated by commas; quotes have no special
/// meaning.
///
/// A leading byte order mark (`U+FEFF`) is removed before the header is
/// read, so it never ends up in the name of the first column.
///
/// # Example
///
/// ```
/// use csvmap::{Reader, Shape};
///
/// #[derive(Debug, Default)]
/// struct Part {
///     id: i32,
///     name: String,
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> csvmap::Result<()> {
/// let shape = Shape::<Part>::new()
///     .integer("Id", |p, v| p.id = v)
///     .text("Name", |p, v| p.name = v);
///
/// let data = "Id,Name\n--,--\n1,bolt\n2,nut\n";
/// let parts = Reader::from_reader(data.as_bytes()).parse(&shape).await?;
///
/// assert_eq!(parts.len(), 2);
/// assert_eq!(parts[1].name, "nut");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Reader<R> {
    rdr: R,
    config: Config,
}

impl<R: AsyncRead + Unpin> Reader<R> {
    /// Create a new CSV reader given a reader of raw CSV data, with a
    /// default configuration.
    ///
    /// To customize parsing, use a `ReaderBuilder`.
    pub fn from_reader(rdr: R) -> Reader<R> {
        ReaderBuilder::new().from_reader(rdr)
    }

    /// Read all input and decode it into records of the given shape.
    ///
    /// The underlying reader is drained and then dropped before any line is
    /// decoded. The first line that fails to decode aborts the whole parse.
    pub async fn parse<T>(self, shape: &Shape<T>) -> Result<Vec<T>> {
        let Reader { mut rdr, config } = self;
        let mut buf = vec![];
        rdr.read_to_end(&mut buf).await?;
        drop(rdr);
        debug!(bytes = buf.len(), "read CSV input");
        config.parse_bytes(&buf, shape)
    }
}

impl Reader<File> {
    /// Create a new CSV reader for the data at the given path, with a
    /// default configuration.
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Reader<File>> {
        ReaderBuilder::new().from_path(path).await
    }
}

#[derive(Clone, Debug)]
struct Config {
    dates: DateParser,
    lossy: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config { dates: DateParser::default(), lossy: true }
    }
}

impl Config {
    fn parse_bytes<T>(
        &self,
        bytes: &[u8],
        shape: &Shape<T>,
    ) -> Result<Vec<T>> {
        let text = if self.lossy {
            bytes.to_str_lossy()
        } else {
            Cow::Borrowed(bytes.to_str().map_err(|err| {
                // Only the detected terminator ends a line, so a lone `\n`
                // in CRLF input does not count.
                let valid = err.valid_up_to();
                let term = Terminator::detect(bytes);
                let line = bytes[..valid].find_iter(term.as_bytes()).count();
                Error::new(ErrorKind::Utf8 {
                    line: line as u64 + 1,
                    err: new_utf8_error(valid),
                })
            })?)
        };
        self.parse_str(&text, shape)
    }

    fn parse_str<T>(&self, text: &str, shape: &Shape<T>) -> Result<Vec<T>> {
        let text = text.strip_prefix(BOM).unwrap_or(text);
        let lines = Lines::detect(text);
        debug!(terminator = %lines.terminator(), "parsing CSV");

        let mut map = ColumnMap::default();
        let mut records = vec![];
        for (i, line) in lines.enumerate() {
            let lineno = i as u64 + 1;
            match i {
                0 => map = ColumnMap::from_header(line, shape.descriptors()),
                1 => {
                    trace!(line = lineno, "skipping second line");
                }
                _ if line.is_empty() => {
                    trace!(line = lineno, "skipping empty line");
                }
                _ => {
                    let record = decode_line(line, &map, shape, &self.dates)
                        .map_err(|err| {
                            let record = records.len() as u64;
                            let pos = Position::new(lineno, record);
                            Error::new(ErrorKind::Decode { pos, err })
                        })?;
                    records.push(record);
                }
            }
        }
        debug!(records = records.len(), "parsed CSV");
        Ok(records)
    }
}

use core::fmt;

use memchr::{memchr, memchr_iter};

/// A line terminator.
///
/// Unlike a general purpose CSV parser, a buffer uses exactly one kind of
/// terminator. If a `\r\n` sequence occurs anywhere in the buffer, then every
/// line is assumed to end with `\r\n` and a lone `\n` is treated as ordinary
/// data. Otherwise, lines end with `\n` and any `\r` is ordinary data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Terminator {
    /// Lines are terminated by `\r\n`.
    CRLF,
    /// Lines are terminated by `\n`.
    LF,
}

impl Terminator {
    /// Detect the terminator used by the given buffer.
    ///
    /// This returns `CRLF` if and only if the buffer contains at least one
    /// `\r\n` sequence.
    pub fn detect(haystack: &[u8]) -> Terminator {
        let crlf = memchr_iter(b'\n', haystack)
            .any(|i| i > 0 && haystack[i - 1] == b'\r');
        if crlf {
            Terminator::CRLF
        } else {
            Terminator::LF
        }
    }

    /// The bytes making up this terminator.
    pub fn as_bytes(&self) -> &'static [u8] {
        match *self {
            Terminator::CRLF => b"\r\n",
            Terminator::LF => b"\n",
        }
    }

    /// Find the start of the first occurrence of this terminator in
    /// `haystack`.
    fn find(&self, haystack: &[u8]) -> Option<usize> {
        match *self {
            Terminator::LF => memchr(b'\n', haystack),
            Terminator::CRLF => memchr_iter(b'\n', haystack)
                .find(|&i| i > 0 && haystack[i - 1] == b'\r')
                .map(|i| i - 1),
        }
    }
}

impl Default for Terminator {
    fn default() -> Terminator {
        Terminator::LF
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Terminator::CRLF => write!(f, "CRLF"),
            Terminator::LF => write!(f, "LF"),
        }
    }
}

/// An iterator over the lines of a buffer.
///
/// Lines are yielded without their terminator. The lifetime `'a` refers to
/// the lifetime of the buffer being split.
#[derive(Clone, Debug)]
pub struct Lines<'a> {
    rest: &'a str,
    term: Terminator,
    done: bool,
}

impl<'a> Lines<'a> {
    /// Split `text` into lines ending with `term`.
    pub fn new(text: &'a str, term: Terminator) -> Lines<'a> {
        Lines { rest: text, term, done: false }
    }

    /// Split `text` into lines, detecting the terminator first.
    pub fn detect(text: &'a str) -> Lines<'a> {
        Lines::new(text, Terminator::detect(text.as_bytes()))
    }

    /// The terminator used by this iterator.
    pub fn terminator(&self) -> Terminator {
        self.term
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.done {
            return None;
        }
        match self.term.find(self.rest.as_bytes()) {
            Some(i) => {
                // Both terminators are ASCII, so `i` and the end of the
                // terminator always fall on a char boundary.
                let line = &self.rest[..i];
                self.rest = &self.rest[i + self.term.as_bytes().len()..];
                Some(line)
            }
            None => {
                self.done = true;
                Some(self.rest)
            }
        }
    }
}

/// An iterator over the cells of a single line.
///
/// Every occurrence of the delimiter ends a cell. Quotes have no special
/// meaning.
#[derive(Clone, Debug)]
pub struct Cells<'a> {
    rest: &'a str,
    delimiter: u8,
    done: bool,
}

impl<'a> Cells<'a> {
    /// Split `line` into cells separated by `delimiter`.
    ///
    /// The delimiter must be an ASCII byte.
    pub fn new(line: &'a str, delimiter: u8) -> Cells<'a> {
        debug_assert!(delimiter.is_ascii(), "delimiter must be ASCII");
        Cells { rest: line, delimiter, done: false }
    }
}

impl<'a> Iterator for Cells<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.done {
            return None;
        }
        match memchr(self.delimiter, self.rest.as_bytes()) {
            Some(i) => {
                let cell = &self.rest[..i];
                self.rest = &self.rest[i + 1..];
                Some(cell)
            }
            None => {
                self.done = true;
                Some(self.rest)
            }
        }
    }
}

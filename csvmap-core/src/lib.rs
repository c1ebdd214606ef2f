/*!
`csvmap-core` provides the raw text plumbing used by `csvmap`: detecting the
line terminator of a buffer, splitting a buffer into lines and splitting a
line into cells.

Splitting is deliberately naive. There is no support for quoting or escaping;
a delimiter byte always ends a cell and a terminator always ends a line. The
splitters mirror the usual "split on separator" semantics found in most
standard libraries:

* An empty input yields exactly one empty piece.
* Adjacent separators yield an empty piece between them.
* A trailing separator yields a trailing empty piece.

This crate does not allocate and works in `no_std` environments.

# Example

```
use csvmap_core::{Cells, Lines, Terminator};

let data = "a,b\r\n1,2\r\n";
let term = Terminator::detect(data.as_bytes());
assert_eq!(term, Terminator::CRLF);

let lines: Vec<&str> = Lines::new(data, term).collect();
assert_eq!(lines, vec!["a,b", "1,2", ""]);

let cells: Vec<&str> = Cells::new(lines[1], b',').collect();
assert_eq!(cells, vec!["1", "2"]);
```
*/

#![deny(missing_docs)]
#![cfg_attr(not(test), no_std)]

pub use split::{Cells, Lines, Terminator};

mod split;

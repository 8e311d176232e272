//! Line iteration that preserves newline termination
//!
//! `std`'s `BufRead::lines` strips the trailing `\n`, which loses the
//! information the write path needs to copy unmatched lines through
//! byte-for-byte. `LineReader` yields each line with its own newline still
//! attached; only a final unterminated line at end-of-file comes back
//! without one.

use std::io::{self, BufRead};

/// Lazy iterator over the lines of a buffered reader.
///
/// Lines can be arbitrarily long; the internal buffer grows as needed.
/// Sequential only: the iterator consumes the reader and cannot be rewound.
/// Each `LineReader` owns its buffer, so concurrent scans need their own
/// reader each.
pub struct LineReader<R> {
    inner: R,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        match self.inner.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(Ok(line)),
            Err(e) => Some(Err(e)),
        }
    }
}

//! Input lines.

use std::io::{self, prelude::*};
use std::mem;

/// A single line without its terminator. Lines are compared byte-wise.
pub type Line = Vec<u8>;

/// Fixed bookkeeping cost charged for every line held in a batch.
pub const LINE_OVERHEAD: u64 = mem::size_of::<Line>() as u64;

/// Iterator over the `\n`-separated lines of a reader.
/// Unlike [`BufRead::lines`] it works on raw bytes, so input does not have to be valid UTF-8.
pub struct ByteLines<R> {
    reader: R,
}

impl<R: BufRead> ByteLines<R> {
    pub fn new(reader: R) -> Self {
        ByteLines { reader }
    }
}

impl<R: BufRead> Iterator for ByteLines<R> {
    type Item = io::Result<Line>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = Vec::new();
        match self.reader.read_until(b'\n', &mut line) {
            Ok(0) => None,
            Ok(_) => {
                if line.last() == Some(&b'\n') {
                    line.pop();
                }
                Some(Ok(line))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

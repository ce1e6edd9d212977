//! Sorted output writer.

use std::io::{self, prelude::*};

use crate::error::{IntegrityError, SortError};
use crate::line::Line;

/// Appends `\n`-terminated lines to the destination, refusing lines that would break the ordering.
///
/// If a sort fails after the sink was created the destination holds an incomplete prefix of the output and
/// must not be treated as sorted data.
pub struct OutputSink<W: Write> {
    writer: io::BufWriter<W>,
    last: Line,
    lines: u64,
}

impl<W: Write> OutputSink<W> {
    pub fn new(writer: W, buf_size: Option<usize>) -> Self {
        let writer = match buf_size {
            Some(buf_size) => io::BufWriter::with_capacity(buf_size, writer),
            None => io::BufWriter::new(writer),
        };

        OutputSink {
            writer,
            last: Vec::new(),
            lines: 0,
        }
    }

    /// Number of lines written so far.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Writes a line followed by `\n`.
    pub fn write(&mut self, line: &[u8]) -> Result<(), SortError> {
        if self.lines > 0 && line < self.last.as_slice() {
            return Err(IntegrityError::OutOfOrder { position: self.lines }.into());
        }

        self.writer.write_all(line).map_err(SortError::Output)?;
        self.writer.write_all(b"\n").map_err(SortError::Output)?;

        self.last.clear();
        self.last.extend_from_slice(line);
        self.lines += 1;

        return Ok(());
    }

    /// Flushes buffered data and returns the destination.
    pub fn finish(self) -> Result<W, SortError> {
        self.writer
            .into_inner()
            .map_err(|err| SortError::Output(err.into_error()))
    }
}

#[cfg(test)]
mod test {
    use super::OutputSink;
    use crate::error::{IntegrityError, SortError};

    #[test]
    fn test_sink() {
        let mut sink = OutputSink::new(Vec::new(), Some(4));
        sink.write(b"apple").unwrap();
        sink.write(b"apple").unwrap();
        sink.write(b"banana").unwrap();
        assert_eq!(sink.lines(), 3);

        let output = sink.finish().unwrap();
        assert_eq!(output, b"apple\napple\nbanana\n");
    }

    #[test]
    fn test_sink_out_of_order() {
        let mut sink = OutputSink::new(Vec::new(), None);
        sink.write(b"b").unwrap();

        match sink.write(b"a") {
            Err(SortError::Integrity(IntegrityError::OutOfOrder { position })) => assert_eq!(position, 1),
            result => panic!("unexpected result: {:?}", result),
        }
        assert_eq!(sink.lines(), 1);
    }
}

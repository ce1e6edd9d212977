//! Persisted sorted runs.
//!
//! Every run is an append-only file inside a temporary directory owned by a [`RunStore`]. A run is written once
//! through a [`RunWriter`], sealed by [`RunWriter::finalize`] and afterwards only consumed from its head by a
//! [`RunCursor`].

use std::fmt;
use std::fs;
use std::io::{self, prelude::*};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};
use tempfile;

use crate::error::SortError;
use crate::line::Line;

/// Run reader type.
pub type RunReader = io::Take<io::BufReader<fs::File>>;

/// Run serialization format.
pub trait RunFormat {
    /// Writes a single line to the run file.
    fn write_line<W: Write>(writer: &mut W, line: &[u8]) -> Result<(), SortError>;

    /// Reads the next line from the run file. Returns [`None`] when the run is exhausted.
    fn read_line(reader: &mut RunReader) -> Result<Option<Line>, SortError>;
}

/// Newline-delimited run format. Lines are stored as is followed by `\n`, so they must not contain `\n`.
pub struct PlainRunFormat;

impl RunFormat for PlainRunFormat {
    fn write_line<W: Write>(writer: &mut W, line: &[u8]) -> Result<(), SortError> {
        writer.write_all(line).map_err(SortError::Storage)?;
        writer.write_all(b"\n").map_err(SortError::Storage)?;
        return Ok(());
    }

    fn read_line(reader: &mut RunReader) -> Result<Option<Line>, SortError> {
        let mut line = Vec::new();
        let read = reader.read_until(b'\n', &mut line).map_err(SortError::Storage)?;
        if read == 0 {
            return Ok(None);
        }
        if line.pop() != Some(b'\n') {
            return Err(SortError::Storage(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "run file truncated",
            )));
        }

        return Ok(Some(line));
    }
}

/// RMP (Rust MessagePack) run format.
/// Every line is stored as a MessagePack `bin` value. For more information see https://msgpack.org/.
pub struct RmpRunFormat;

struct RawLine<'a>(&'a [u8]);

impl Serialize for RawLine<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.0)
    }
}

struct OwnedLine(Line);

impl<'de> Deserialize<'de> for OwnedLine {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LineVisitor;

        impl<'de> Visitor<'de> for LineVisitor {
            type Value = OwnedLine;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a byte string")
            }

            fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                Ok(OwnedLine(v.to_vec()))
            }

            fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
                Ok(OwnedLine(v))
            }
        }

        deserializer.deserialize_byte_buf(LineVisitor)
    }
}

impl RunFormat for RmpRunFormat {
    fn write_line<W: Write>(writer: &mut W, line: &[u8]) -> Result<(), SortError> {
        rmp_serde::encode::write(writer, &RawLine(line)).map_err(SortError::Serialization)
    }

    fn read_line(reader: &mut RunReader) -> Result<Option<Line>, SortError> {
        if reader.limit() == 0 {
            return Ok(None);
        }
        let line: OwnedLine = rmp_serde::decode::from_read(reader).map_err(SortError::Deserialization)?;

        return Ok(Some(line.0));
    }
}

/// Handle of a sealed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    index: usize,
    path: PathBuf,
    lines: u64,
    bytes: u64,
}

impl RunHandle {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of lines stored in the run.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Run file size.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

/// Temporary-directory-backed run storage.
pub struct RunStore<F: RunFormat = PlainRunFormat> {
    /// Directory holding run files.
    dir: tempfile::TempDir,
    /// Run file read/write buffer size.
    rw_buf_size: Option<usize>,
    /// Index of the next run to be created.
    next_index: usize,

    format: PhantomData<F>,
}

impl<F: RunFormat> RunStore<F> {
    /// Creates a run store.
    ///
    /// # Arguments
    /// * `tmp_path` - Directory the store directory is created in. If the parameter is [`None`] default OS
    ///   temporary directory will be used.
    /// * `rw_buf_size` - Run file read/write buffer size.
    pub fn new(tmp_path: Option<&Path>, rw_buf_size: Option<usize>) -> Result<Self, SortError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ext-line-sort-");
        let dir = if let Some(tmp_path) = tmp_path {
            builder.tempdir_in(tmp_path)
        } else {
            builder.tempdir()
        }
        .map_err(SortError::TempDir)?;

        log::info!("using {} as a temporary directory", dir.path().display());

        return Ok(RunStore {
            dir,
            rw_buf_size,
            next_index: 0,
            format: PhantomData,
        });
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Number of runs created so far.
    pub fn runs_created(&self) -> usize {
        self.next_index
    }

    /// Allocates a new empty run.
    pub fn create_run(&mut self) -> Result<RunWriter<F>, SortError> {
        let index = self.next_index;
        let path = self.dir.path().join(format!("run-{}", index));
        let file = fs::File::create(&path).map_err(SortError::Storage)?;
        self.next_index += 1;

        let writer = match self.rw_buf_size {
            Some(buf_size) => io::BufWriter::with_capacity(buf_size, file),
            None => io::BufWriter::new(file),
        };

        return Ok(RunWriter {
            index,
            path,
            writer: Some(writer),
            lines: 0,
            sealed: false,
            format: PhantomData,
        });
    }

    /// Persists already sorted lines as a new run.
    pub fn persist(&mut self, lines: impl IntoIterator<Item = Line>) -> Result<RunHandle, SortError> {
        let mut writer = self.create_run()?;
        for line in lines {
            writer.append(&line)?;
        }

        return writer.finalize();
    }

    /// Opens a cursor positioned at the first line of the run.
    pub fn open_cursor(&self, handle: &RunHandle) -> Result<RunCursor<F>, SortError> {
        let file = fs::File::open(&handle.path).map_err(SortError::Storage)?;
        let reader = match self.rw_buf_size {
            Some(buf_size) => io::BufReader::with_capacity(buf_size, file),
            None => io::BufReader::new(file),
        };

        return RunCursor::new(handle.index, reader.take(handle.bytes));
    }

    /// Removes the file of a run that was merged into a later one.
    /// A file left behind is removed with the whole store by [`RunStore::cleanup`].
    pub fn discard(&self, handle: &RunHandle) {
        match fs::remove_file(&handle.path) {
            Ok(()) => log::debug!("run {} discarded", handle.index),
            Err(err) => log::warn!("run file {} not removed: {}", handle.path.display(), err),
        }
    }

    /// Removes all run storage. Failures are logged, not returned.
    pub fn cleanup(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => log::debug!("temporary directory {} removed", path.display()),
            Err(err) => log::warn!("temporary directory {} not removed: {}", path.display(), err),
        }
    }
}

/// Writer of a run being built. The run file is removed on drop unless the writer is finalized.
pub struct RunWriter<F: RunFormat> {
    index: usize,
    path: PathBuf,
    writer: Option<io::BufWriter<fs::File>>,
    lines: u64,
    sealed: bool,

    format: PhantomData<F>,
}

impl<F: RunFormat> RunWriter<F> {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Appends a line to the run. Lines must be appended in sorted order.
    pub fn append(&mut self, line: &[u8]) -> Result<(), SortError> {
        let writer = self.writer.as_mut().ok_or_else(Self::closed)?;
        F::write_line(writer, line)?;
        self.lines += 1;

        return Ok(());
    }

    /// Seals the run for reading.
    pub fn finalize(mut self) -> Result<RunHandle, SortError> {
        let writer = self.writer.take().ok_or_else(Self::closed)?;
        let file = writer.into_inner().map_err(|err| SortError::Storage(err.into_error()))?;
        file.sync_data().map_err(SortError::Storage)?;
        let bytes = file.metadata().map_err(SortError::Storage)?.len();
        self.sealed = true;

        log::debug!("run {} saved (lines: {}, bytes: {})", self.index, self.lines, bytes);

        return Ok(RunHandle {
            index: self.index,
            path: self.path.clone(),
            lines: self.lines,
            bytes,
        });
    }

    fn closed() -> SortError {
        SortError::Storage(io::Error::new(io::ErrorKind::Other, "run writer closed"))
    }
}

impl<F: RunFormat> Drop for RunWriter<F> {
    fn drop(&mut self) {
        if self.sealed {
            return;
        }
        drop(self.writer.take());

        log::debug!("discarding unfinished run {}", self.index);
        if let Err(err) = fs::remove_file(&self.path) {
            log::warn!("unfinished run file {} not removed: {}", self.path.display(), err);
        }
    }
}

/// Forward-only reader over a run. Keeps the current head line until it is advanced past.
pub struct RunCursor<F: RunFormat> {
    index: usize,
    reader: RunReader,
    head: Option<Line>,

    format: PhantomData<F>,
}

impl<F: RunFormat> RunCursor<F> {
    fn new(index: usize, mut reader: RunReader) -> Result<Self, SortError> {
        let head = F::read_line(&mut reader)?;

        return Ok(RunCursor {
            index,
            reader,
            head,
            format: PhantomData,
        });
    }

    /// Index of the run the cursor reads.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the current head line without consuming it.
    pub fn peek(&self) -> Option<&[u8]> {
        self.head.as_deref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.head.is_none()
    }

    /// Discards the current head and reads the next line.
    pub fn advance(&mut self) -> Result<(), SortError> {
        self.pop().map(|_| ())
    }

    /// Takes the current head and advances the cursor.
    pub fn pop(&mut self) -> Result<Option<Line>, SortError> {
        let head = match self.head.take() {
            Some(head) => head,
            None => return Ok(None),
        };
        self.head = F::read_line(&mut self.reader)?;

        return Ok(Some(head));
    }
}

//! Sorting errors.

use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// Merge consistency violation. Indicates a bug rather than an environment fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// The merge emitted a different number of lines than run generation recorded.
    LineCountMismatch { expected: u64, actual: u64 },
    /// A line smaller than its predecessor reached the output.
    OutOfOrder { position: u64 },
}

impl Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityError::LineCountMismatch { expected, actual } => {
                write!(f, "merged {} lines, but {} were recorded", actual, expected)
            }
            IntegrityError::OutOfOrder { position } => write!(f, "line {} is out of order", position),
        }
    }
}

/// Sorting error.
#[derive(Debug)]
pub enum SortError {
    /// Input file does not exist.
    InputNotFound(PathBuf),
    /// Memory budget does not exceed the current process footprint.
    BudgetTooSmall { required: u64 },
    /// Process memory statistics are not available.
    MemoryMonitor(&'static str),
    /// Temporary directory creation error.
    TempDir(io::Error),
    /// Workers thread pool initialization error.
    ThreadPoolBuildError(rayon::ThreadPoolBuildError),
    /// Input stream error.
    Input(io::Error),
    /// Run file I/O error.
    Storage(io::Error),
    /// Run serialization error.
    Serialization(rmp_serde::encode::Error),
    /// Run deserialization error.
    Deserialization(rmp_serde::decode::Error),
    /// Output file error.
    Output(io::Error),
    /// Merge consistency error.
    Integrity(IntegrityError),
    /// Sorting was cancelled by the caller.
    Cancelled,
}

impl SortError {
    /// Returns `true` if the error was caused by secondary storage (run files, temporary directory or output).
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            SortError::TempDir(_)
                | SortError::Storage(_)
                | SortError::Serialization(_)
                | SortError::Deserialization(_)
                | SortError::Output(_)
        )
    }
}

impl Error for SortError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            SortError::TempDir(err) => Some(err),
            SortError::ThreadPoolBuildError(err) => Some(err),
            SortError::Input(err) => Some(err),
            SortError::Storage(err) => Some(err),
            SortError::Serialization(err) => Some(err),
            SortError::Deserialization(err) => Some(err),
            SortError::Output(err) => Some(err),
            SortError::InputNotFound(_)
            | SortError::BudgetTooSmall { .. }
            | SortError::MemoryMonitor(_)
            | SortError::Integrity(_)
            | SortError::Cancelled => None,
        }
    }
}

impl Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            SortError::InputNotFound(path) => write!(f, "input file {} not found", path.display()),
            SortError::BudgetTooSmall { required } => {
                write!(f, "memory budget is too small, it should be at least {} bytes", required)
            }
            SortError::MemoryMonitor(reason) => write!(f, "memory monitor unavailable: {}", reason),
            SortError::TempDir(err) => write!(f, "temporary directory not created: {}", err),
            SortError::ThreadPoolBuildError(err) => write!(f, "thread pool initialization failed: {}", err),
            SortError::Input(err) => write!(f, "input data stream error: {}", err),
            SortError::Storage(err) => write!(f, "run storage I/O failed: {}", err),
            SortError::Serialization(err) => write!(f, "run serialization error: {}", err),
            SortError::Deserialization(err) => write!(f, "run deserialization error: {}", err),
            SortError::Output(err) => write!(f, "output write failed: {}", err),
            SortError::Integrity(err) => write!(f, "merge integrity violated: {}", err),
            SortError::Cancelled => write!(f, "sorting cancelled"),
        }
    }
}

impl From<IntegrityError> for SortError {
    fn from(err: IntegrityError) -> Self {
        SortError::Integrity(err)
    }
}

/// Returns [`SortError::Cancelled`] if the flag is raised.
pub(crate) fn ensure_not_cancelled(cancel: Option<&AtomicBool>) -> Result<(), SortError> {
    match cancel {
        Some(flag) if flag.load(Ordering::Relaxed) => Err(SortError::Cancelled),
        _ => Ok(()),
    }
}

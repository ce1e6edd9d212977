//! `ext-line-sort` sorts text files that do not fit into memory.
//!
//! Sorting is done in two phases. During the first phase lines are accumulated in memory until the memory
//! budget is exhausted, then the batch is sorted and persisted as a run in a temporary directory. During the
//! second phase runs are merged into the output using a binary heap holding the head line of every run. At most
//! [`DEFAULT_MERGE_FAN_IN`] runs (configurable) are merged at once, larger run sets are first folded into
//! intermediate runs.
//! For more information see [External Sorting](https://en.wikipedia.org/wiki/External_sorting).
//!
//! # Overview
//!
//! * **Byte ordering:**
//!   lines are compared as raw bytes, input does not have to be valid UTF-8. Empty lines are dropped.
//! * **Memory budget:**
//!   a run is flushed once the process footprint reported by a [`MemoryMonitor`] plus the buffered lines
//!   would exceed the budget (`process-memory` feature provides a monitor based on the process resident set).
//! * **Run format agnostic:**
//!   runs are stored as plain newline-delimited text by default, `MessagePack` is available as well.
//! * **Multithreading support:**
//!   every run is sorted in multiple threads.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use ext_line_sort::{BudgetedBufferBuilder, LineSorterBuilder, MemoryBudget, SimulatedMemoryMonitor};
//!
//! let monitor = Arc::new(SimulatedMemoryMonitor::constant(0));
//! let sorter = LineSorterBuilder::new()
//!     .with_buffer(BudgetedBufferBuilder::new(MemoryBudget::new(50 * 1024 * 1024), monitor))
//!     .with_tmp_dir(Path::new("./"))
//!     .build()
//!     .unwrap();
//!
//! let summary = sorter.sort_file(Path::new("input.txt"), Path::new("output.txt")).unwrap();
//! println!("{} lines sorted using {} runs", summary.lines, summary.runs);
//! ```

pub mod buffer;
pub mod builder;
pub mod error;
pub mod line;
pub mod memory;
pub mod merger;
pub mod run;
pub mod sink;
pub mod sort;

pub use buffer::{BudgetedBufferBuilder, LineLimitedBufferBuilder, RunBuffer, RunBufferBuilder};
pub use builder::{RunBuilder, RunSet};
pub use error::{IntegrityError, SortError};
pub use line::{ByteLines, Line};
pub use memory::{MemoryBudget, MemoryMonitor, SimulatedMemoryMonitor};
pub use merger::KWayMerger;
pub use run::{PlainRunFormat, RmpRunFormat, RunCursor, RunFormat, RunHandle, RunStore};
pub use sink::OutputSink;
pub use sort::{LineSorter, LineSorterBuilder, SortSummary, DEFAULT_MERGE_FAN_IN};

//! Run accumulation buffers.
//!
//! A buffer decides which lines are admitted into the batch that becomes the next run.

use std::sync::Arc;

use rayon;

use crate::error::SortError;
use crate::line::{Line, LINE_OVERHEAD};
use crate::memory::{MemoryBudget, MemoryMonitor};

/// Buffer builder.
pub trait RunBufferBuilder {
    type Buffer: RunBuffer;

    /// Creates a new empty buffer.
    fn build(&self) -> Self::Buffer;

    /// Verifies that buffers can be built at all. Called once before the first line is read.
    fn preflight(&self) -> Result<(), SortError> {
        Ok(())
    }
}

/// Base run buffer interface.
pub trait RunBuffer: IntoIterator<Item = Line> + rayon::slice::ParallelSliceMut<Line> + Send {
    /// Tries to add a line to the buffer. A rejected line is handed back.
    fn admit(&mut self, line: Line) -> Result<(), Line>;

    /// Adds a line unconditionally.
    fn push(&mut self, line: Line);

    /// Returns buffer length
    fn len(&self) -> usize;

    /// Returns accounted size of the buffered lines.
    fn mem_size(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct LineLimitedBufferBuilder {
    buffer_limit: usize,
}

impl LineLimitedBufferBuilder {
    pub fn new(buffer_limit: usize) -> Self {
        LineLimitedBufferBuilder { buffer_limit }
    }
}

impl RunBufferBuilder for LineLimitedBufferBuilder {
    type Buffer = LineLimitedBuffer;

    fn build(&self) -> Self::Buffer {
        LineLimitedBuffer::new(self.buffer_limit)
    }
}

impl Default for LineLimitedBufferBuilder {
    fn default() -> Self {
        LineLimitedBufferBuilder {
            buffer_limit: usize::MAX,
        }
    }
}

/// Buffer limited by line count.
pub struct LineLimitedBuffer {
    limit: usize,
    current_size: u64,
    inner: Vec<Line>,
}

impl LineLimitedBuffer {
    pub fn new(limit: usize) -> Self {
        LineLimitedBuffer {
            limit,
            current_size: 0,
            inner: Vec::new(),
        }
    }
}

impl RunBuffer for LineLimitedBuffer {
    fn admit(&mut self, line: Line) -> Result<(), Line> {
        if self.inner.len() >= self.limit {
            return Err(line);
        }
        self.push(line);
        return Ok(());
    }

    fn push(&mut self, line: Line) {
        self.current_size += LINE_OVERHEAD + line.len() as u64;
        self.inner.push(line);
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn mem_size(&self) -> u64 {
        self.current_size
    }
}

impl IntoIterator for LineLimitedBuffer {
    type Item = Line;
    type IntoIter = <Vec<Line> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl rayon::slice::ParallelSliceMut<Line> for LineLimitedBuffer {
    fn as_parallel_slice_mut(&mut self) -> &mut [Line] {
        self.inner.as_mut_slice()
    }
}

/// Builder of buffers bounded by a memory budget.
pub struct BudgetedBufferBuilder<M: MemoryMonitor> {
    budget: MemoryBudget,
    monitor: Arc<M>,
}

impl<M: MemoryMonitor> BudgetedBufferBuilder<M> {
    pub fn new(budget: MemoryBudget, monitor: Arc<M>) -> Self {
        BudgetedBufferBuilder { budget, monitor }
    }
}

impl<M: MemoryMonitor> RunBufferBuilder for BudgetedBufferBuilder<M> {
    type Buffer = BudgetedBuffer<M>;

    fn build(&self) -> Self::Buffer {
        BudgetedBuffer::new(self.budget, self.monitor.clone())
    }

    fn preflight(&self) -> Result<(), SortError> {
        self.budget.check(self.monitor.as_ref())
    }
}

/// Buffer admitting lines while the process footprint plus the buffered bytes stay within the budget.
pub struct BudgetedBuffer<M: MemoryMonitor> {
    budget: MemoryBudget,
    monitor: Arc<M>,
    current_size: u64,
    inner: Vec<Line>,
}

impl<M: MemoryMonitor> BudgetedBuffer<M> {
    pub fn new(budget: MemoryBudget, monitor: Arc<M>) -> Self {
        BudgetedBuffer {
            budget,
            monitor,
            current_size: 0,
            inner: Vec::new(),
        }
    }
}

impl<M: MemoryMonitor> RunBuffer for BudgetedBuffer<M> {
    fn admit(&mut self, line: Line) -> Result<(), Line> {
        let footprint = self.monitor.footprint();
        let required = self.current_size + LINE_OVERHEAD + line.len() as u64;
        if !self.budget.admits(footprint, required) {
            return Err(line);
        }
        self.push(line);
        return Ok(());
    }

    fn push(&mut self, line: Line) {
        self.current_size += LINE_OVERHEAD + line.len() as u64;
        self.inner.push(line);
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn mem_size(&self) -> u64 {
        self.current_size
    }
}

impl<M: MemoryMonitor> IntoIterator for BudgetedBuffer<M> {
    type Item = Line;
    type IntoIter = <Vec<Line> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<M: MemoryMonitor> rayon::slice::ParallelSliceMut<Line> for BudgetedBuffer<M> {
    fn as_parallel_slice_mut(&mut self) -> &mut [Line] {
        self.inner.as_mut_slice()
    }
}

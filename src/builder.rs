//! Sorted run generation.

use std::io;
use std::mem;
use std::sync::atomic::AtomicBool;

use rayon::slice::ParallelSliceMut;

use crate::buffer::{RunBuffer, RunBufferBuilder};
use crate::error::{ensure_not_cancelled, SortError};
use crate::line::Line;
use crate::run::{RunFormat, RunHandle, RunStore};

/// Runs produced by the first sorting phase.
#[derive(Debug, Clone, Default)]
pub struct RunSet {
    /// Sealed runs in creation order.
    pub handles: Vec<RunHandle>,
    /// Total number of lines over all runs.
    pub lines: u64,
}

impl RunSet {
    pub fn runs(&self) -> usize {
        self.handles.len()
    }
}

/// Splits an input stream into sorted runs.
///
/// Lines are accumulated in a buffer until it rejects one. The buffer is then sorted and persisted as a run
/// and the rejected line starts a new buffer, where it is always accepted. Empty lines are dropped.
pub struct RunBuilder<'a, B, F>
where
    B: RunBufferBuilder,
    F: RunFormat,
{
    buffer_builder: &'a B,
    store: &'a mut RunStore<F>,
    thread_pool: &'a rayon::ThreadPool,
    cancel: Option<&'a AtomicBool>,
}

impl<'a, B, F> RunBuilder<'a, B, F>
where
    B: RunBufferBuilder,
    F: RunFormat,
{
    pub fn new(buffer_builder: &'a B, store: &'a mut RunStore<F>, thread_pool: &'a rayon::ThreadPool) -> Self {
        RunBuilder {
            buffer_builder,
            store,
            thread_pool,
            cancel: None,
        }
    }

    /// Sets a flag stopping run generation between lines once raised.
    pub fn with_cancel_flag(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        return self;
    }

    /// Consumes the input and persists it as sorted runs.
    pub fn build<I>(mut self, input: I) -> Result<RunSet, SortError>
    where
        I: IntoIterator<Item = io::Result<Line>>,
    {
        let mut run_set = RunSet::default();
        let mut buffer = self.buffer_builder.build();

        for line in input.into_iter() {
            ensure_not_cancelled(self.cancel)?;

            let line = line.map_err(SortError::Input)?;
            if line.is_empty() {
                continue;
            }

            if let Err(line) = buffer.admit(line) {
                if !buffer.is_empty() {
                    let full = mem::replace(&mut buffer, self.buffer_builder.build());
                    run_set.handles.push(self.flush(full)?);
                }
                buffer.push(line);
            }
            run_set.lines += 1;
        }

        if !buffer.is_empty() {
            run_set.handles.push(self.flush(buffer)?);
        }

        log::debug!(
            "run generation done (lines: {}, runs: {})",
            run_set.lines,
            run_set.runs()
        );

        return Ok(run_set);
    }

    fn flush(&mut self, mut buffer: B::Buffer) -> Result<RunHandle, SortError> {
        log::debug!(
            "sorting run data (lines: {}, bytes: {}) ...",
            buffer.len(),
            buffer.mem_size()
        );
        self.thread_pool.install(|| {
            buffer.par_sort_unstable();
        });

        log::debug!("saving run data");
        return self.store.persist(buffer);
    }
}
